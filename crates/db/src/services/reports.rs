use std::sync::Arc;

use chrono::NaiveDate;

use leadgen_core::errors::ApplicationError;
use leadgen_core::reporting::build_daily_report;
use leadgen_core::DailyReport;

use crate::repositories::{BrandRepository, QaAnalysisRepository, SellerRepository};

pub struct ReportService {
    sellers: Arc<dyn SellerRepository>,
    brands: Arc<dyn BrandRepository>,
    analyses: Arc<dyn QaAnalysisRepository>,
}

impl ReportService {
    pub fn new(
        sellers: Arc<dyn SellerRepository>,
        brands: Arc<dyn BrandRepository>,
        analyses: Arc<dyn QaAnalysisRepository>,
    ) -> Self {
        Self { sellers, brands, analyses }
    }

    pub async fn daily_report(&self, date: NaiveDate) -> Result<DailyReport, ApplicationError> {
        let sellers = self.sellers.all().await?;
        let brands = self.brands.all().await?;
        let analyses = self.analyses.all().await?;

        let report = build_daily_report(date, &sellers, &brands, &analyses);
        tracing::info!(
            event_name = "reports.daily.generated",
            date = %date,
            qa_completed = report.summary.qa_completed,
            "daily report generated"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use leadgen_core::domain::brand::Brand;
    use leadgen_core::domain::seller::Seller;
    use leadgen_core::qa::price::{Price, ProductRecord};
    use leadgen_core::reporting::NO_ISSUES_MESSAGE;
    use leadgen_core::QaAnalyzer;

    use super::ReportService;
    use crate::repositories::{
        BrandRepository, InMemoryBrandRepository, InMemoryQaAnalysisRepository,
        InMemorySellerRepository, QaAnalysisRepository, SellerRepository,
    };

    #[tokio::test]
    async fn daily_report_reads_every_repository() {
        let sellers = Arc::new(InMemorySellerRepository::default());
        let brands = Arc::new(InMemoryBrandRepository::default());
        let analyses = Arc::new(InMemoryQaAnalysisRepository::default());

        let brand = Brand::new("Acme");
        brands.save(brand.clone()).await.expect("brand");
        sellers.save(Seller::new("Acme Supply")).await.expect("seller");
        let products = vec![ProductRecord {
            asin: "B0001".to_string(),
            price: Some(Price::Amount(20.0)),
            ..ProductRecord::default()
        }];
        analyses
            .save(QaAnalyzer::default().analyze(&brand, &products).expect("analysis"))
            .await
            .expect("save");

        let service = ReportService::new(sellers, brands, analyses);
        let report = service.daily_report(Utc::now().date_naive()).await.expect("report");

        assert_eq!(report.summary.new_sellers, 1);
        assert_eq!(report.summary.new_brands, 1);
        assert_eq!(report.summary.qa_completed, 1);
        assert_eq!(report.summary.profitable_brands, 1);
        assert_eq!(report.issues, vec![NO_ISSUES_MESSAGE.to_string()]);
    }
}
