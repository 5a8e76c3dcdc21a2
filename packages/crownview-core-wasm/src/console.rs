#[cfg(test)]
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

// This allows us to access console.log / console.warn from JS
#[wasm_bindgen]
extern "C" {
    // Use `js_namespace` to bind `console.log(..)` instead of just `log(..)`
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = warn)]
    pub fn warn(s: &str);
}

// Note: The console_log macro is defined in lib.rs to avoid duplication

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
}

/// Sink for pipeline diagnostics.
///
/// The loader never writes to the console directly; callers hand in a sink so
/// that loading stays a plain function of its inputs and tests can inspect
/// what was reported.
pub trait Diagnostics {
    fn emit(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }
}

/// Writes to the browser console. Only usable on wasm32 targets.
pub struct ConsoleDiagnostics;

impl Diagnostics for ConsoleDiagnostics {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::Info => log(message),
            Level::Warn => warn(message),
        }
    }
}

/// Keeps every entry in memory.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingDiagnostics {
    entries: RefCell<Vec<(Level, String)>>,
}

#[cfg(test)]
impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[cfg(test)]
impl Diagnostics for RecordingDiagnostics {
    fn emit(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}
