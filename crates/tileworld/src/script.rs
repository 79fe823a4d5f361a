use serde_json::Value;

/// Handle to one instance of a scripted event owned by the dialogue/event system.
pub trait ScriptedEvent {
    fn fire(&mut self);
    fn destroy(&mut self);
}

/// Builds scripted-event handles from their opaque descriptors.
pub trait ScriptedEventProvider {
    fn get_event_instance(&mut self, descriptor: &Value) -> Box<dyn ScriptedEvent>;
}

/// Binding that fires `event` whenever an object's enabled flag is set to `on_enable`.
pub struct ToggleEnableBinding {
    pub event: Box<dyn ScriptedEvent>,
    pub on_enable: bool,
}

impl std::fmt::Debug for ToggleEnableBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggleEnableBinding")
            .field("on_enable", &self.on_enable)
            .finish_non_exhaustive()
    }
}
