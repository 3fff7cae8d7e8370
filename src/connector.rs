//! The connector callback protocol.
//!
//! A connector declares outgoing edges for one vertex by calling
//! [`ConnectCtx::connect`] zero or more times. Nothing reaches the
//! graph synchronously — each call only appends to a per-visit buffer
//! that the engine drains after the connector returns.

/// Handle passed into a connector/subconnector callback. Collects
/// `(label, terminus)` declarations in call order; the engine attaches
/// edges to the visited vertex's outgoing list in this same order.
pub struct ConnectCtx<'a, V, E> {
    declared: &'a mut Vec<(E, V)>,
}

impl<'a, V, E> ConnectCtx<'a, V, E> {
    pub(crate) fn new(declared: &'a mut Vec<(E, V)>) -> Self {
        Self { declared }
    }

    /// Declare an outgoing edge from the vertex currently being
    /// visited to `terminus`, labeled `label`.
    pub fn connect(&mut self, label: E, terminus: V) {
        self.declared.push((label, terminus));
    }
}

/// Declares outgoing edges for a vertex during discovery.
pub trait Connector<V, E>: Send + Sync {
    fn connect(&self, vertex: &V, ctx: &mut ConnectCtx<'_, V, E>) -> anyhow::Result<()>;
}

/// Like [`Connector`], but additionally sees the label of the edge it
/// was reached by and whether it is the initial vertex, letting the
/// client shape outgoing edges based on how the vertex was reached.
pub trait Subconnector<V, E>: Send + Sync {
    fn connect(
        &self,
        is_initial: bool,
        incident_label: Option<&E>,
        vertex: &V,
        ctx: &mut ConnectCtx<'_, V, E>,
    ) -> anyhow::Result<()>;
}

impl<V, E, T: Connector<V, E> + ?Sized> Connector<V, E> for std::sync::Arc<T> {
    fn connect(&self, vertex: &V, ctx: &mut ConnectCtx<'_, V, E>) -> anyhow::Result<()> {
        (**self).connect(vertex, ctx)
    }
}

/// Any plain connector can serve wherever a subconnector is expected;
/// it simply ignores the extra context.
pub struct AsSubconnector<C>(pub C);

impl<C, V, E> Subconnector<V, E> for AsSubconnector<C>
where
    C: Connector<V, E>,
{
    fn connect(
        &self,
        _is_initial: bool,
        _incident_label: Option<&E>,
        vertex: &V,
        ctx: &mut ConnectCtx<'_, V, E>,
    ) -> anyhow::Result<()> {
        self.0.connect(vertex, ctx)
    }
}
