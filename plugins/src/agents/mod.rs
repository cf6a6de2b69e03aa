mod scripted;

pub use scripted::{ModeScript, ScriptFile, ScriptedAgent, ScriptedFailure};
