/// Pure transformation applied to every outgoing message before resolution.
pub trait ScriptHook: Send + Sync {
    /// Returns the rewritten text.
    fn on_message_send(&self, text: &str) -> String;
}

/// Hook that leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughHook;

impl ScriptHook for PassthroughHook {
    fn on_message_send(&self, text: &str) -> String {
        text.to_string()
    }
}
