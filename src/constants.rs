//! Application-wide constants and default values
//!
//! Centralized location for all hard-coded values to improve maintainability

/// Hub node identity and port layout
pub mod hub {
    /// Class type that identifies a pipe hub node
    pub const CLASS_TYPE: &str = "PipeHub";

    /// Title given to a hub when it is created
    pub const TITLE: &str = "🔗 Pipe Hub";

    /// Maximum number of (inK, outK) pairs a hub can expose
    pub const MAX_PAIRS: usize = 30;

    /// A hub never shrinks below this many pairs
    pub const MIN_PAIRS: usize = 2;

    /// Name of the hub input carrying the upstream pipe
    pub const PIPE_IN: &str = "pipe_in";

    /// Name of the hub output carrying the downstream pipe
    pub const PIPE_OUT: &str = "pipe";

    /// Prefix of numbered pair inputs (`in1`, `in2`, ...)
    pub const PAIR_INPUT_PREFIX: &str = "in";

    /// Prefix of numbered pair outputs (`out1`, `out2`, ...)
    pub const PAIR_OUTPUT_PREFIX: &str = "out";

    /// Slot type of the pipe ports
    pub const PIPE_TYPE: &str = "PIPE";

    /// Slot type accepted by every pair port
    pub const ANY_TYPE: &str = "*";

    /// Name of the always-visible fix button widget
    pub const FIX_BUTTON: &str = "Fix";

    /// Context menu entry that runs a fix on the hub's network
    pub const FIX_MENU_LABEL: &str = "Fix Pipe Network";
}

/// Node role classification
pub mod roles {
    /// Class types that always forward their input unchanged
    pub const PASS_THROUGH_CLASSES: &[&str] = &["Reroute"];

    /// Widget name fragments that mark the widget holding a Set/Get key
    pub const KEY_WIDGET_HINTS: &[&str] = &["key", "name", "constant", "id"];
}

/// Timing of deferred work
pub mod timing {
    /// Number of cold start polls after a hub is created
    pub const COLD_START_ATTEMPTS: u32 = 7;

    /// Delay between cold start polls (milliseconds)
    pub const COLD_START_INTERVAL_MS: u64 = 450;

    /// Delay between the graph load signal and the boot scan (milliseconds)
    pub const BOOT_DELAY_MS: u64 = 700;

    /// Upper bound on scheduler batches run by a single `run_until_idle`
    pub const MAX_IDLE_BATCHES: usize = 10_000;
}

/// Node sizing
pub mod layout {
    /// Default node width
    pub const NODE_WIDTH: f32 = 180.0;

    /// Height of the title bar
    pub const TITLE_HEIGHT: f32 = 26.0;

    /// Vertical space taken by each slot row
    pub const SLOT_HEIGHT: f32 = 20.0;

    /// Vertical space taken by each widget row
    pub const WIDGET_HEIGHT: f32 = 24.0;
}
