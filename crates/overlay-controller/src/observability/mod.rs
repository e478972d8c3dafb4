//! Observability for the Overlay Controller.
//!
//! All instrumentation uses `#[instrument(skip_all)]` with explicit fields.
//! Metric labels are bounded enums, never participant or conference ids.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `oc_events_total` | Counter | `class` | Domain events handled |
//! | `oc_events_filtered_total` | Counter | none | Events dropped by the conference filter |
//! | `oc_event_latency_seconds` | Histogram | `class` | Event handling time |
//! | `oc_attach_total` | Counter | `outcome` | Attach executions (attached, aborted, failed) |
//! | `oc_detach_total` | Counter | `reason`, `release` | Detach requests that did something |
//! | `oc_roster_size` | Gauge | none | Current roster length |
//! | `oc_collaborator_errors_total` | Counter | `category` | Failures reported to the error sink |
//! | `oc_actor_mailbox_depth` | Gauge | none | Controller mailbox depth |

pub mod metrics;

pub use metrics::{
    init_metrics_recorder, record_attach, record_collaborator_error, record_detach,
    record_event, record_event_filtered, record_event_latency, set_mailbox_depth,
    set_roster_size,
};
