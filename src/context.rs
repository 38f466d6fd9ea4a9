//! Per-poll collection state.

use crate::client::QueryClient;

/// State carried through one collection pass over a device.
///
/// Holds the device's query client and the label values resolved so far.
/// Descending into a narrower scope (device, then interface, then cell)
/// derives a new context with [`CollectorContext::with_labels`]; the parent
/// is never touched, so sibling branches can keep deriving from it.
#[derive(Clone)]
pub struct CollectorContext<'a> {
    /// Query transport for the device being polled
    pub client: &'a dyn QueryClient,
    labels: Vec<String>,
}

impl<'a> CollectorContext<'a> {
    /// Root context with no labels.
    pub fn new(client: &'a dyn QueryClient) -> Self {
        Self {
            client,
            labels: Vec::new(),
        }
    }

    /// Label values accumulated so far, outermost scope first.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Child context with `values` appended to this context's labels.
    pub fn with_labels<I, S>(&self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels = self.labels.clone();
        labels.extend(values.into_iter().map(Into::into));
        Self {
            client: self.client,
            labels,
        }
    }
}

impl std::fmt::Debug for CollectorContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorContext")
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}
