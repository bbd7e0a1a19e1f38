use std::sync::Arc;
use std::time::Duration;

use leadgen_db::services::{DuplicateEntity, DuplicateService};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Spawns the periodic duplicate sweep. An interval of zero disables it.
pub fn spawn(service: Arc<DuplicateService>, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        info!(
            event_name = "duplicates.sweep.disabled",
            correlation_id = "bootstrap",
            "periodic duplicate sweep disabled"
        );
        return None;
    }

    info!(
        event_name = "duplicates.sweep.scheduled",
        correlation_id = "bootstrap",
        interval_secs,
        "periodic duplicate sweep scheduled"
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_once(&service).await;
        }
    }))
}

/// One pass over sellers then brands. Failures are logged and the next pass
/// still runs.
pub async fn run_once(service: &DuplicateService) -> usize {
    let mut flagged = 0;
    for entity in [DuplicateEntity::Sellers, DuplicateEntity::Brands] {
        match service.sweep(entity, true).await {
            Ok(report) => flagged += report.flagged,
            Err(error) => warn!(
                event_name = "duplicates.sweep.failed",
                correlation_id = "sweep",
                entity = entity.as_str(),
                error = %error,
                "periodic duplicate sweep failed"
            ),
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use leadgen_core::domain::brand::Brand;
    use leadgen_core::domain::seller::Seller;
    use leadgen_db::repositories::{
        BrandRepository, InMemoryBrandRepository, InMemorySellerRepository, SellerRepository,
    };
    use leadgen_db::services::DuplicateService;

    use super::{run_once, spawn};

    #[tokio::test]
    async fn zero_interval_disables_the_sweep() {
        let service = Arc::new(DuplicateService::new(
            Arc::new(InMemorySellerRepository::default()),
            Arc::new(InMemoryBrandRepository::default()),
        ));
        assert!(spawn(service, 0).is_none());
    }

    #[tokio::test]
    async fn one_pass_covers_sellers_and_brands() {
        let sellers = Arc::new(InMemorySellerRepository::default());
        let brands = Arc::new(InMemoryBrandRepository::default());
        sellers.save(Seller::new("Trail Supply")).await.expect("seller");
        sellers.save(Seller::new("TRAIL SUPPLY")).await.expect("seller");
        brands.save(Brand::new("Acme")).await.expect("brand");
        brands.save(Brand::new("acme")).await.expect("brand");
        let service = DuplicateService::new(sellers, brands);

        assert_eq!(run_once(&service).await, 2);
        assert_eq!(run_once(&service).await, 0);
    }
}
