use std::fs;
use std::path::Path;
use std::sync::Arc;

use leadgen_core::domain::brand::{Brand, BrandId};
use leadgen_core::errors::ApplicationError;
use leadgen_core::qa::price::ProductRecord;
use leadgen_core::StaticPriceSource;
use leadgen_db::repositories::{SqlBrandRepository, SqlQaAnalysisRepository};
use leadgen_db::services::qa::DefaultQaAnalyzer;
use leadgen_db::services::QaService;
use serde::Deserialize;

use crate::commands::{
    application_failure, finish, load_config, open_database, runtime, CommandFailure,
    CommandResult,
};

const AD_HOC_BRAND: &str = "ad-hoc";

#[derive(Deserialize)]
#[serde(untagged)]
enum ProductsFile {
    Bare(Vec<ProductRecord>),
    Wrapped { products: Vec<ProductRecord> },
}

/// Without a brand id the products are analyzed in memory and nothing is
/// stored.
pub fn run(products_path: &Path, brand_id: Option<&str>, brand_name: Option<&str>) -> CommandResult {
    finish("analyze", analyze(products_path, brand_id, brand_name))
}

fn analyze(
    products_path: &Path,
    brand_id: Option<&str>,
    brand_name: Option<&str>,
) -> Result<CommandResult, CommandFailure> {
    let products = read_products(products_path)?;

    let Some(brand_id) = brand_id.map(str::trim).filter(|id| !id.is_empty()) else {
        let brand = Brand::new(brand_name.unwrap_or(AD_HOC_BRAND));
        let analysis = DefaultQaAnalyzer::default()
            .analyze(&brand, &products)
            .map_err(|error| application_failure(ApplicationError::from(error)))?;
        return Ok(CommandResult::success_with_data(
            "analyze",
            format!("analyzed {} products (not persisted)", analysis.products_analyzed),
            &analysis,
        ));
    };

    let config = load_config()?;
    let runtime = runtime()?;
    let analysis = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let service = QaService::new(
            Arc::new(SqlBrandRepository::new(pool.clone())),
            Arc::new(SqlQaAnalysisRepository::new(pool.clone())),
            Arc::new(StaticPriceSource::default()),
        );
        let result = service.analyze_products(&BrandId(brand_id.to_string()), &products).await;
        pool.close().await;
        result.map_err(application_failure)
    })?;

    Ok(CommandResult::success_with_data(
        "analyze",
        format!("stored analysis `{}` for brand `{}`", analysis.id.0, analysis.brand_id.0),
        &analysis,
    ))
}

fn read_products(path: &Path) -> Result<Vec<ProductRecord>, CommandFailure> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ("invalid_input", format!("failed to read `{}`: {error}", path.display()), 6)
    })?;
    let parsed: ProductsFile = serde_json::from_str(&raw).map_err(|error| {
        ("invalid_input", format!("`{}` is not a product list: {error}", path.display()), 6)
    })?;

    Ok(match parsed {
        ProductsFile::Bare(products) | ProductsFile::Wrapped { products } => products,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::Value;

    use super::run;

    fn products_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write products");
        file
    }

    #[test]
    fn ad_hoc_analysis_reports_metrics_without_a_database() {
        let file = products_file(
            r#"{"products": [
                {"asin": "B01", "title": "Trail Pack", "price": 100.0, "brand": "Trailhead"},
                {"asin": "B02", "title": "Trail Tent", "price": {"amount": 50.0, "currency": "USD"}, "brand": "Trailhead"},
                {"asin": "B03", "title": "Trail Mug", "price": null, "brand": "Trailhead"}
            ]}"#,
        );

        let result = run(file.path(), None, Some("Trailhead"));
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload: Value = serde_json::from_str(&result.output).expect("json output");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["brand_name"], "Trailhead");
        assert_eq!(payload["data"]["products_analyzed"], 3);
    }

    #[test]
    fn malformed_product_file_is_an_input_error() {
        let file = products_file("{\"products\": 12}");

        let result = run(file.path(), None, None);
        assert_eq!(result.exit_code, 6);

        let payload: Value = serde_json::from_str(&result.output).expect("json output");
        assert_eq!(payload["error_class"], "invalid_input");
    }
}
