use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};

use leadgen_core::domain::brand::{Brand, BrandId};
use leadgen_core::domain::{RecordStatus, ValidationStatus};

use super::{
    decode_error, decode_timestamp, encode_timestamp, search_pattern, BrandFilter,
    BrandRepository, Page, PageRequest, RepositoryError,
};
use crate::DbPool;

const BRAND_COLUMNS: &str = "id, name, domain, email, phone, social_media, description, industry,
    location, status, is_duplicate, validation_status, validation_issues, notes, created_at,
    updated_at";

pub struct SqlBrandRepository {
    pool: DbPool,
}

impl SqlBrandRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_brand(row: &sqlx::sqlite::SqliteRow) -> Result<Brand, RepositoryError> {
    let status: String = row.try_get("status").map_err(decode_error)?;
    let validation_status: String = row.try_get("validation_status").map_err(decode_error)?;
    let social_media: String = row.try_get("social_media").map_err(decode_error)?;
    let validation_issues: String = row.try_get("validation_issues").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_error)?;

    Ok(Brand {
        id: BrandId(row.try_get("id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        domain: row.try_get("domain").map_err(decode_error)?,
        email: row.try_get("email").map_err(decode_error)?,
        phone: row.try_get("phone").map_err(decode_error)?,
        social_media: serde_json::from_str::<BTreeMap<String, String>>(&social_media)
            .map_err(decode_error)?,
        description: row.try_get("description").map_err(decode_error)?,
        industry: row.try_get("industry").map_err(decode_error)?,
        location: row.try_get("location").map_err(decode_error)?,
        status: RecordStatus::parse(&status)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown brand status `{status}`")))?,
        is_duplicate: row.try_get("is_duplicate").map_err(decode_error)?,
        validation_status: ValidationStatus::parse(&validation_status).ok_or_else(|| {
            RepositoryError::Decode(format!("unknown validation status `{validation_status}`"))
        })?,
        validation_issues: serde_json::from_str(&validation_issues).map_err(decode_error)?,
        notes: row.try_get("notes").map_err(decode_error)?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &BrandFilter) {
    builder.push(" WHERE 1=1");
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(validation_status) = filter.validation_status {
        builder.push(" AND validation_status = ").push_bind(validation_status.as_str());
    }
    if let Some(is_duplicate) = filter.is_duplicate {
        builder.push(" AND is_duplicate = ").push_bind(is_duplicate);
    }
    if let Some(pattern) = search_pattern(filter.search.as_deref()) {
        builder
            .push(" AND (LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(IFNULL(email, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(IFNULL(domain, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait::async_trait]
impl BrandRepository for SqlBrandRepository {
    async fn find_by_id(&self, id: &BrandId) -> Result<Option<Brand>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {BRAND_COLUMNS} FROM brands WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_brand).transpose()
    }

    async fn save(&self, brand: Brand) -> Result<(), RepositoryError> {
        let social_media = serde_json::to_string(&brand.social_media).map_err(decode_error)?;
        let validation_issues =
            serde_json::to_string(&brand.validation_issues).map_err(decode_error)?;

        sqlx::query(
            "INSERT INTO brands (id, name, domain, email, phone, social_media, description,
                                 industry, location, status, is_duplicate, validation_status,
                                 validation_issues, notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 domain = excluded.domain,
                 email = excluded.email,
                 phone = excluded.phone,
                 social_media = excluded.social_media,
                 description = excluded.description,
                 industry = excluded.industry,
                 location = excluded.location,
                 status = excluded.status,
                 is_duplicate = excluded.is_duplicate,
                 validation_status = excluded.validation_status,
                 validation_issues = excluded.validation_issues,
                 notes = excluded.notes,
                 updated_at = excluded.updated_at",
        )
        .bind(&brand.id.0)
        .bind(&brand.name)
        .bind(&brand.domain)
        .bind(&brand.email)
        .bind(&brand.phone)
        .bind(social_media)
        .bind(&brand.description)
        .bind(&brand.industry)
        .bind(&brand.location)
        .bind(brand.status.as_str())
        .bind(brand.is_duplicate)
        .bind(brand.validation_status.as_str())
        .bind(validation_issues)
        .bind(&brand.notes)
        .bind(encode_timestamp(&brand.created_at))
        .bind(encode_timestamp(&brand.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(
        &self,
        filter: &BrandFilter,
        page: PageRequest,
    ) -> Result<Page<Brand>, RepositoryError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) AS count FROM brands");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build()
            .fetch_one(&self.pool)
            .await?
            .try_get("count")
            .map_err(decode_error)?;

        let mut query = QueryBuilder::new(format!("SELECT {BRAND_COLUMNS} FROM brands"));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        let rows = query.build().fetch_all(&self.pool).await?;

        let brands = rows.iter().map(row_to_brand).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(brands, u64::try_from(total).unwrap_or_default(), page))
    }

    async fn all(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {BRAND_COLUMNS} FROM brands ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_brand).collect()
    }

    async fn set_duplicate_flag(&self, id: &BrandId, flag: bool) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE brands SET is_duplicate = ?, updated_at = ? WHERE id = ?")
                .bind(flag)
                .bind(encode_timestamp(&Utc::now()))
                .bind(&id.0)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &BrandId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM brands WHERE id = ?").bind(&id.0).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use leadgen_core::domain::brand::{Brand, BrandId};
    use leadgen_core::domain::{RecordStatus, ValidationStatus};
    use leadgen_core::QaAnalyzer;

    use super::SqlBrandRepository;
    use crate::repositories::{
        BrandFilter, BrandRepository, PageRequest, QaAnalysisRepository, SqlQaAnalysisRepository,
    };
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlBrandRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlBrandRepository::new(pool)
    }

    fn brand(name: &str, minutes_ago: i64) -> Brand {
        let mut brand = Brand::new(name);
        brand.created_at = Utc::now() - Duration::minutes(minutes_ago);
        brand.updated_at = brand.created_at;
        brand
    }

    #[tokio::test]
    async fn save_and_find_round_trip_preserves_fields() {
        let repo = setup().await;
        let mut acme = brand("Acme", 0);
        acme.domain = Some("https://acme.example".to_string());
        acme.social_media.insert("linkedin".to_string(), "https://linkedin.com/acme".to_string());
        acme.validation_issues = vec!["Invalid email format".to_string()];
        acme.status = RecordStatus::Flagged;

        repo.save(acme.clone()).await.expect("save");
        let loaded = repo.find_by_id(&acme.id).await.expect("find").expect("present");

        assert_eq!(loaded.name, "Acme");
        assert_eq!(loaded.social_media, acme.social_media);
        assert_eq!(loaded.validation_issues, acme.validation_issues);
        assert_eq!(loaded.status, RecordStatus::Flagged);
        assert_eq!(loaded.created_at.timestamp_micros(), acme.created_at.timestamp_micros());

        let missing = repo.find_by_id(&BrandId("nope".to_string())).await.expect("find");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn list_filters_paginates_and_orders_newest_first() {
        let repo = setup().await;
        for (index, name) in ["Alpha", "Bravo", "Charlie", "Delta", "Echo"].into_iter().enumerate() {
            repo.save(brand(name, 10 - index as i64)).await.expect("save");
        }

        let first = repo.list(&BrandFilter::default(), PageRequest::new(1, 2)).await.expect("list");
        assert_eq!(first.total, 5);
        assert_eq!(first.pages, 3);
        assert_eq!(
            first.data.iter().map(|brand| brand.name.as_str()).collect::<Vec<_>>(),
            vec!["Echo", "Delta"]
        );

        let last = repo.list(&BrandFilter::default(), PageRequest::new(3, 2)).await.expect("list");
        assert_eq!(last.data.len(), 1);
        assert_eq!(last.data[0].name, "Alpha");

        let search = BrandFilter { search: Some("RAV".to_string()), ..BrandFilter::default() };
        let found = repo.list(&search, PageRequest::default()).await.expect("search");
        assert_eq!(found.total, 1);
        assert_eq!(found.data[0].name, "Bravo");
    }

    #[tokio::test]
    async fn duplicate_flag_and_validation_filters_combine() {
        let repo = setup().await;
        let mut acme = brand("Acme", 5);
        acme.validation_status = ValidationStatus::Invalid;
        acme.validation_issues = vec!["Invalid domain".to_string()];
        repo.save(acme.clone()).await.expect("save");

        assert!(repo.set_duplicate_flag(&acme.id, true).await.expect("flag"));
        assert!(!repo.set_duplicate_flag(&BrandId("ghost".to_string()), true).await.expect("flag"));

        let duplicates = BrandFilter { is_duplicate: Some(true), ..BrandFilter::default() };
        let page = repo.list(&duplicates, PageRequest::default()).await.expect("list");
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].validation_status, ValidationStatus::Invalid);
        assert_eq!(page.data[0].validation_issues, vec!["Invalid domain".to_string()]);

        let invalid_originals = BrandFilter {
            is_duplicate: Some(false),
            validation_status: Some(ValidationStatus::Invalid),
            ..BrandFilter::default()
        };
        assert_eq!(repo.list(&invalid_originals, PageRequest::default()).await.expect("list").total, 0);
    }

    #[tokio::test]
    async fn delete_removes_the_brand_and_its_analyses() {
        let repo = setup().await;
        let older = brand("Acme", 30);
        let newer = brand("ACME", 1);
        repo.save(older.clone()).await.expect("save");
        repo.save(newer.clone()).await.expect("save");

        let analysis = QaAnalyzer::default().analyze(&newer, &[]).expect("analysis");
        let analyses = SqlQaAnalysisRepository::new(repo.pool.clone());
        analyses.save(analysis).await.expect("analysis");

        assert!(repo.delete(&newer.id).await.expect("delete"));
        assert!(!repo.delete(&newer.id).await.expect("delete again"));
        assert!(analyses.latest_for_brand(&newer.id).await.expect("latest").is_none());

        let all = repo.all().await.expect("all");
        assert_eq!(all.iter().map(|brand| brand.id.clone()).collect::<Vec<_>>(), vec![older.id]);
    }
}
