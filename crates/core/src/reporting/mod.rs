//! Count-by-bucket aggregates over QA analyses, and the daily report that
//! bundles them for downstream rendering.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::analysis::QaAnalysis;
use crate::domain::brand::Brand;
use crate::domain::seller::Seller;
use crate::domain::ValidationStatus;
use crate::qa::classify::ProfitabilityStatus;
use crate::qa::competition::CompetitionLevel;
use crate::qa::round_to;

pub const TOP_PERFORMER_LIMIT: usize = 5;
pub const NO_ISSUES_MESSAGE: &str = "No critical issues flagged";

/// Every status is present, zero when unused.
pub fn profitability_distribution(analyses: &[QaAnalysis]) -> BTreeMap<ProfitabilityStatus, u32> {
    let mut distribution =
        ProfitabilityStatus::ALL.into_iter().map(|status| (status, 0)).collect::<BTreeMap<_, _>>();
    for analysis in analyses {
        *distribution.entry(analysis.classification.status).or_default() += 1;
    }
    distribution
}

/// Every level is present, zero when unused.
pub fn competition_distribution(analyses: &[QaAnalysis]) -> BTreeMap<CompetitionLevel, u32> {
    let mut distribution =
        CompetitionLevel::ALL.into_iter().map(|level| (level, 0)).collect::<BTreeMap<_, _>>();
    for analysis in analyses {
        *distribution.entry(analysis.competition.level).or_default() += 1;
    }
    distribution
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub new_sellers: u32,
    pub new_brands: u32,
    pub qa_completed: u32,
    pub profitable_brands: u32,
    pub total_sellers: u32,
    pub total_brands: u32,
    pub total_qa: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub average_profit_margin: f64,
    pub average_competition_score: f64,
    /// Percentage of the day's analyses that were profitable.
    pub profitability_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopProfitableBrand {
    pub brand_name: String,
    pub margin_percent: f64,
    pub status: ProfitabilityStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopCompetitionBrand {
    pub brand_name: String,
    pub competition_score: u32,
    pub level: CompetitionLevel,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopPerformers {
    pub top_profitable_brands: Vec<TopProfitableBrand>,
    pub top_competition_brands: Vec<TopCompetitionBrand>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub summary: ReportSummary,
    pub metrics: ReportMetrics,
    pub top_performers: TopPerformers,
    pub profitability_distribution: BTreeMap<ProfitabilityStatus, u32>,
    pub competition_distribution: BTreeMap<CompetitionLevel, u32>,
    pub issues: Vec<String>,
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Builds the report for `date` from full snapshots. "New" means created on
/// that UTC date; top performers and issues consider the whole snapshot.
pub fn build_daily_report(
    date: NaiveDate,
    sellers: &[Seller],
    brands: &[Brand],
    analyses: &[QaAnalysis],
) -> DailyReport {
    let new_sellers = sellers.iter().filter(|seller| seller.created_at.date_naive() == date).count();
    let new_brands = brands.iter().filter(|brand| brand.created_at.date_naive() == date).count();
    let new_analyses = analyses
        .iter()
        .filter(|analysis| analysis.created_at.date_naive() == date)
        .cloned()
        .collect::<Vec<_>>();
    let profitable = new_analyses
        .iter()
        .filter(|analysis| analysis.classification.status.is_profitable())
        .count();

    let metrics = if new_analyses.is_empty() {
        ReportMetrics::default()
    } else {
        let total = new_analyses.len() as f64;
        let margin = new_analyses.iter().map(|a| a.metrics.margin_percent).sum::<f64>() / total;
        let score =
            new_analyses.iter().map(|a| f64::from(a.competition.score)).sum::<f64>() / total;
        ReportMetrics {
            average_profit_margin: round_to(margin, 2),
            average_competition_score: round_to(score, 2),
            profitability_rate: round_to(profitable as f64 / total * 100.0, 2),
        }
    };

    DailyReport {
        date,
        summary: ReportSummary {
            new_sellers: count(new_sellers),
            new_brands: count(new_brands),
            qa_completed: count(new_analyses.len()),
            profitable_brands: count(profitable),
            total_sellers: count(sellers.len()),
            total_brands: count(brands.len()),
            total_qa: count(analyses.len()),
        },
        metrics,
        top_performers: top_performers(analyses),
        profitability_distribution: profitability_distribution(&new_analyses),
        competition_distribution: competition_distribution(&new_analyses),
        issues: flagged_issues(sellers, brands),
    }
}

fn top_performers(analyses: &[QaAnalysis]) -> TopPerformers {
    let mut by_margin =
        analyses.iter().filter(|analysis| analysis.metrics.margin_percent > 0.0).collect::<Vec<_>>();
    by_margin.sort_by(|a, b| b.metrics.margin_percent.total_cmp(&a.metrics.margin_percent));

    let mut by_score =
        analyses.iter().filter(|analysis| analysis.competition.score > 0).collect::<Vec<_>>();
    by_score.sort_by(|a, b| b.competition.score.cmp(&a.competition.score));

    TopPerformers {
        top_profitable_brands: by_margin
            .into_iter()
            .take(TOP_PERFORMER_LIMIT)
            .map(|analysis| TopProfitableBrand {
                brand_name: analysis.brand_name.clone(),
                margin_percent: analysis.metrics.margin_percent,
                status: analysis.classification.status,
            })
            .collect(),
        top_competition_brands: by_score
            .into_iter()
            .take(TOP_PERFORMER_LIMIT)
            .map(|analysis| TopCompetitionBrand {
                brand_name: analysis.brand_name.clone(),
                competition_score: analysis.competition.score,
                level: analysis.competition.level,
            })
            .collect(),
    }
}

fn flagged_issues(sellers: &[Seller], brands: &[Brand]) -> Vec<String> {
    let mut issues = Vec::new();

    let duplicate_sellers = sellers.iter().filter(|seller| seller.is_duplicate).count();
    let duplicate_brands = brands.iter().filter(|brand| brand.is_duplicate).count();
    if duplicate_sellers > 0 {
        issues.push(format!("{duplicate_sellers} duplicate sellers flagged"));
    }
    if duplicate_brands > 0 {
        issues.push(format!("{duplicate_brands} duplicate brands flagged"));
    }

    let invalid_sellers = sellers
        .iter()
        .filter(|seller| seller.validation_status == ValidationStatus::Invalid)
        .count();
    let invalid_brands =
        brands.iter().filter(|brand| brand.validation_status == ValidationStatus::Invalid).count();
    if invalid_sellers > 0 {
        issues.push(format!("{invalid_sellers} sellers with validation issues"));
    }
    if invalid_brands > 0 {
        issues.push(format!("{invalid_brands} brands with validation issues"));
    }

    if issues.is_empty() {
        issues.push(NO_ISSUES_MESSAGE.to_string());
    }
    issues
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::{build_daily_report, competition_distribution, profitability_distribution};
    use crate::domain::analysis::QaAnalysis;
    use crate::domain::brand::Brand;
    use crate::domain::seller::Seller;
    use crate::domain::ValidationStatus;
    use crate::qa::classify::ProfitabilityStatus;
    use crate::qa::competition::CompetitionLevel;
    use crate::qa::price::{Price, ProductRecord};
    use crate::qa::QaAnalyzer;

    fn analysis_for(name: &str, count: usize, price: f64) -> QaAnalysis {
        let products = (0..count)
            .map(|index| ProductRecord {
                asin: format!("{name}-{index}"),
                price: Some(Price::Amount(price)),
                ..ProductRecord::default()
            })
            .collect::<Vec<_>>();
        let mut brand = Brand::new(name);
        brand.social_media.insert("linkedin".to_string(), "https://linkedin.com/x".to_string());
        QaAnalyzer::default().analyze(&brand, &products).expect("analysis")
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
    }

    #[test]
    fn distributions_include_every_bucket() {
        let analyses = vec![analysis_for("Acme", 25, 30.0), analysis_for("Zed", 1, 5.0)];

        let profitability = profitability_distribution(&analyses);
        assert_eq!(profitability.len(), ProfitabilityStatus::ALL.len());
        assert_eq!(profitability[&ProfitabilityStatus::HighlyProfitable], 2);
        assert_eq!(profitability[&ProfitabilityStatus::Unknown], 0);

        let competition = competition_distribution(&analyses);
        assert_eq!(competition.len(), CompetitionLevel::ALL.len());
        assert_eq!(competition.values().sum::<u32>(), 2);
    }

    #[test]
    fn daily_report_counts_only_that_day_as_new() {
        let at_noon = Utc.from_utc_datetime(&day().and_hms_opt(12, 0, 0).expect("time"));

        let mut today = analysis_for("Acme", 25, 30.0);
        today.created_at = at_noon;
        let mut today_small = analysis_for("Bolt", 3, 200.0);
        today_small.created_at = at_noon;
        let mut yesterday = analysis_for("Crest", 20, 40.0);
        yesterday.created_at = at_noon - Duration::days(1);

        let mut seller = Seller::new("Acme Supply");
        seller.created_at = at_noon;
        seller.is_duplicate = true;
        let mut brand = Brand::new("Acme");
        brand.created_at = at_noon - Duration::days(2);
        brand.validation_status = ValidationStatus::Invalid;

        let report = build_daily_report(
            day(),
            &[seller],
            &[brand],
            &[today.clone(), today_small.clone(), yesterday],
        );

        assert_eq!(report.summary.new_sellers, 1);
        assert_eq!(report.summary.new_brands, 0);
        assert_eq!(report.summary.qa_completed, 2);
        assert_eq!(report.summary.total_qa, 3);
        assert_eq!(report.summary.profitable_brands, 2);
        assert_eq!(report.metrics.average_profit_margin, 30.0);
        assert_eq!(
            report.metrics.average_competition_score,
            f64::from(today.competition.score + today_small.competition.score) / 2.0
        );
        assert_eq!(report.metrics.profitability_rate, 100.0);
        assert_eq!(report.top_performers.top_competition_brands[0].brand_name, "Acme");
        assert_eq!(report.top_performers.top_profitable_brands.len(), 3);
        assert_eq!(
            report.issues,
            vec!["1 duplicate sellers flagged".to_string(), "1 brands with validation issues".to_string()]
        );
    }

    #[test]
    fn quiet_day_reports_no_issues_and_zero_metrics() {
        let report = build_daily_report(day(), &[], &[], &[]);

        assert_eq!(report.metrics.profitability_rate, 0.0);
        assert_eq!(report.issues, vec![super::NO_ISSUES_MESSAGE.to_string()]);
        assert!(report.top_performers.top_profitable_brands.is_empty());
    }
}
