// self
use crate::{_prelude::*, obs::FlowKind};

/// Future returned by [`FlowSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`].
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// `xbl_auth.flow` span around one public operation.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span tagged with the flow kind and the stage it starts in.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("xbl_auth.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Runs `fut` inside the span.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn span_passes_output_through() {
		let span = FlowSpan::new(FlowKind::DeviceToken, "span_passes_output_through");
		let value = span.instrument(async { 7_u8 }).await;

		crate::obs::log_debug!("device token span yielded {value}");

		assert_eq!(value, 7);
	}
}
