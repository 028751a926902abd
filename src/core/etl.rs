use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting external resource link report");

        // Extract
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} content rows", raw_data.len());

        // Transform
        let bundle = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "🔄 Rendered reports for {} courses ({} with domain rollups), {} rows skipped",
            bundle.exhaustive_courses,
            bundle.domain_courses,
            bundle.rows_skipped
        );

        // Load
        let delivered_to = self.pipeline.load(bundle).await?;
        tracing::info!("📤 Reports delivered to: {}", delivered_to);

        Ok(delivered_to)
    }
}
