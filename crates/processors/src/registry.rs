use {
    super::processor::DocumentProcessor,
    crate::builtin::PresentationAck,
    docbridge_media::ProcessorKind,
    std::collections::HashMap,
    tracing::debug,
};

#[cfg(feature = "metrics")]
use docbridge_metrics::{gauge, processors as proc_metrics};

/// Registry of the processor for each renderable kind.
pub struct ProcessorRegistry {
    processors: HashMap<ProcessorKind, Box<dyn DocumentProcessor>>,
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    /// Registry with the presentation acknowledgement processor installed.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PresentationAck));
        registry
    }

    /// Install `processor` for its kind, replacing any previous one.
    ///
    /// Processors claiming [`ProcessorKind::Unknown`] are ignored.
    pub fn register(&mut self, processor: Box<dyn DocumentProcessor>) {
        let kind = processor.kind();
        if kind == ProcessorKind::Unknown {
            debug!(processor = processor.name(), "ignoring processor for unknown kind");
            return;
        }
        debug!(%kind, processor = processor.name(), "registered processor");
        self.processors.insert(kind, processor);
        #[cfg(feature = "metrics")]
        gauge!(proc_metrics::REGISTERED).set(self.processors.len() as f64);
    }

    pub fn get(&self, kind: ProcessorKind) -> Option<&dyn DocumentProcessor> {
        self.processors.get(&kind).map(|p| p.as_ref())
    }

    pub fn kinds(&self) -> Vec<ProcessorKind> {
        let mut kinds: Vec<_> = self.processors.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}
