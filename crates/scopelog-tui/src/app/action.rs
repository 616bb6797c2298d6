/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,

    // UI toggles
    ToggleHelp,
    ToggleFilterPanel,
    CloseFilterPanel,

    // Filter panel grid
    PanelUp,
    PanelDown,
    PanelLeft,
    PanelRight,
    PanelToggle,

    // Log viewer actions
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollToTop,
    ScrollToBottom,
    PageUp,
    PageDown,
    ToggleAutoScroll,
    ClearLogs,
}
