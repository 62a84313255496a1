use std::collections::HashSet;
use std::sync::LazyLock;
use strum_macros::{Display, EnumIter};

/// Mission phase of the logger. Exactly one is active at a time; the
/// independent time-synced flag lives on the recorder, not here.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display, EnumIter, serde::Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FlightState {
    Idle,
    Armed,
    Launched,
    Apogee,
    Landed,
}

/// Legal state transitions. Landed has no outgoing edges: post-landing
/// log closing runs outside the state machine. The only way back to Idle
/// is the disarm edge.
static LEGAL_TRANSITIONS: LazyLock<HashSet<(FlightState, FlightState)>> = LazyLock::new(|| {
    let mut lookup = HashSet::new();
    let edges = vec![
        (FlightState::Idle, FlightState::Armed),
        (FlightState::Armed, FlightState::Idle),
        (FlightState::Armed, FlightState::Launched),
        (FlightState::Launched, FlightState::Apogee),
        (FlightState::Apogee, FlightState::Landed),
    ];
    for edge in edges {
        lookup.insert(edge);
    }
    lookup
});

impl FlightState {
    pub fn can_transition_to(self, target: FlightState) -> bool {
        LEGAL_TRANSITIONS.contains(&(self, target))
    }

    /// Armed and every later state commit the logger to high-rate
    /// recording.
    pub fn is_flight_active(self) -> bool {
        !matches!(self, FlightState::Idle)
    }
}
