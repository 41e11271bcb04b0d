//! The fixed server capability table. Real DAP implementations publish
//! dozens of `supportsX` flags; this is the representative subset the
//! session core actually backs.

use crate::session::types::CapabilityFlag;

pub fn server_capabilities() -> Vec<CapabilityFlag> {
    [
        ("supportsConfigurationDoneRequest", true),
        ("supportsTerminateRequest", true),
        ("supportsEvaluateForHovers", false),
        ("supportsConditionalBreakpoints", false),
        ("supportsFunctionBreakpoints", false),
        ("supportsDelayedStackTraceLoading", false),
        ("supportsSetVariable", false),
        ("supportsLogPoints", false),
    ]
    .into_iter()
    .map(|(name, supported)| CapabilityFlag {
        name: name.to_string(),
        supported,
    })
    .collect()
}
