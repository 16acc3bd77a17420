use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    name: String,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(name: impl Into<String>, pipeline: P) -> Self {
        Self {
            pipeline,
            name: name.into(),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting {}", self.name);

        let raw_data = self.pipeline.extract().await?;
        tracing::info!("📥 {}: extracted {} records", self.name, raw_data.len());

        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!("🔄 {}: {} records after transform", self.name, transformed.len());

        let outcome = self.pipeline.load(transformed).await?;
        tracing::info!("📤 {}: {}", self.name, outcome);

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Record, Table};
    use crate::utils::error::ThoughtError;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticPipeline {
        fail_load: bool,
    }

    #[async_trait]
    impl Pipeline for StaticPipeline {
        async fn extract(&self) -> Result<Table> {
            let rows = [json!({"name": "a"}), json!({"name": "b"})];
            Ok(Table::from_records(rows.iter().map(|r| {
                Record::new(r.as_object().cloned().unwrap_or_default())
            })))
        }

        async fn transform(&self, data: Table) -> Result<Table> {
            Ok(Table::from_records(data.into_records().into_iter().take(1)))
        }

        async fn load(&self, result: Table) -> Result<String> {
            if self.fail_load {
                return Err(ThoughtError::ProcessingError {
                    message: "load failed".to_string(),
                });
            }
            Ok(format!("loaded {}", result.len()))
        }
    }

    #[tokio::test]
    async fn test_run_chains_stages() {
        let engine = EtlEngine::new("static", StaticPipeline { fail_load: false });
        assert_eq!(engine.run().await.unwrap(), "loaded 1");
    }

    #[tokio::test]
    async fn test_run_propagates_stage_errors() {
        let engine = EtlEngine::new("static", StaticPipeline { fail_load: true });
        tokio_test::assert_err!(engine.run().await);
    }
}
