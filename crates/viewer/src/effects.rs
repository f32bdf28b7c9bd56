use layers::info_panel::RenderInstruction;

/// Side effect requested by the viewer, applied by the embedding shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace the info panel contents (or hide it).
    Panel(RenderInstruction),
    /// New caption for the rotation button.
    ToggleLabel(&'static str),
    /// Open a link in a new browsing context.
    OpenUrl(String),
}
