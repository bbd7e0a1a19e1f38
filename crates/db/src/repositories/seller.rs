use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};

use leadgen_core::domain::seller::{Seller, SellerId};
use leadgen_core::domain::{RecordStatus, ValidationStatus};

use super::{
    decode_error, decode_timestamp, encode_timestamp, search_pattern, Page, PageRequest,
    RepositoryError, SellerFilter, SellerRepository,
};
use crate::DbPool;

const SELLER_COLUMNS: &str = "id, name, email, store_url, phone, company_name, location, rating,
    total_reviews, status, is_duplicate, validation_status, validation_issues, notes, created_at,
    updated_at";

pub struct SqlSellerRepository {
    pool: DbPool,
}

impl SqlSellerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_seller(row: &sqlx::sqlite::SqliteRow) -> Result<Seller, RepositoryError> {
    let status: String = row.try_get("status").map_err(decode_error)?;
    let validation_status: String = row.try_get("validation_status").map_err(decode_error)?;
    let validation_issues: String = row.try_get("validation_issues").map_err(decode_error)?;
    let total_reviews: i64 = row.try_get("total_reviews").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_error)?;

    Ok(Seller {
        id: SellerId(row.try_get("id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        email: row.try_get("email").map_err(decode_error)?,
        store_url: row.try_get("store_url").map_err(decode_error)?,
        phone: row.try_get("phone").map_err(decode_error)?,
        company_name: row.try_get("company_name").map_err(decode_error)?,
        location: row.try_get("location").map_err(decode_error)?,
        rating: row.try_get("rating").map_err(decode_error)?,
        total_reviews: u32::try_from(total_reviews).map_err(decode_error)?,
        status: RecordStatus::parse(&status)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown seller status `{status}`")))?,
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

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &SellerFilter) {
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
            .push(" OR LOWER(IFNULL(company_name, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait::async_trait]
impl SellerRepository for SqlSellerRepository {
    async fn find_by_id(&self, id: &SellerId) -> Result<Option<Seller>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {SELLER_COLUMNS} FROM sellers WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_seller).transpose()
    }

    async fn save(&self, seller: Seller) -> Result<(), RepositoryError> {
        let validation_issues =
            serde_json::to_string(&seller.validation_issues).map_err(decode_error)?;

        sqlx::query(
            "INSERT INTO sellers (id, name, email, store_url, phone, company_name, location,
                                  rating, total_reviews, status, is_duplicate, validation_status,
                                  validation_issues, notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 email = excluded.email,
                 store_url = excluded.store_url,
                 phone = excluded.phone,
                 company_name = excluded.company_name,
                 location = excluded.location,
                 rating = excluded.rating,
                 total_reviews = excluded.total_reviews,
                 status = excluded.status,
                 is_duplicate = excluded.is_duplicate,
                 validation_status = excluded.validation_status,
                 validation_issues = excluded.validation_issues,
                 notes = excluded.notes,
                 updated_at = excluded.updated_at",
        )
        .bind(&seller.id.0)
        .bind(&seller.name)
        .bind(&seller.email)
        .bind(&seller.store_url)
        .bind(&seller.phone)
        .bind(&seller.company_name)
        .bind(&seller.location)
        .bind(seller.rating)
        .bind(i64::from(seller.total_reviews))
        .bind(seller.status.as_str())
        .bind(seller.is_duplicate)
        .bind(seller.validation_status.as_str())
        .bind(validation_issues)
        .bind(&seller.notes)
        .bind(encode_timestamp(&seller.created_at))
        .bind(encode_timestamp(&seller.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(
        &self,
        filter: &SellerFilter,
        page: PageRequest,
    ) -> Result<Page<Seller>, RepositoryError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) AS count FROM sellers");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build()
            .fetch_one(&self.pool)
            .await?
            .try_get("count")
            .map_err(decode_error)?;

        let mut query = QueryBuilder::new(format!("SELECT {SELLER_COLUMNS} FROM sellers"));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        let rows = query.build().fetch_all(&self.pool).await?;

        let sellers = rows.iter().map(row_to_seller).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(sellers, u64::try_from(total).unwrap_or_default(), page))
    }

    async fn all(&self) -> Result<Vec<Seller>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELLER_COLUMNS} FROM sellers ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_seller).collect()
    }

    async fn set_duplicate_flag(
        &self,
        id: &SellerId,
        flag: bool,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE sellers SET is_duplicate = ?, updated_at = ? WHERE id = ?")
                .bind(flag)
                .bind(encode_timestamp(&Utc::now()))
                .bind(&id.0)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &SellerId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM sellers WHERE id = ?").bind(&id.0).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use leadgen_core::domain::seller::Seller;
    use leadgen_core::domain::ValidationStatus;

    use super::SqlSellerRepository;
    use crate::repositories::{PageRequest, SellerFilter, SellerRepository};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlSellerRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlSellerRepository::new(pool)
    }

    #[tokio::test]
    async fn upsert_keeps_created_at_and_replaces_fields() {
        let repo = setup().await;
        let mut seller = Seller::new("Trail Supply");
        seller.rating = Some(4.6);
        seller.total_reviews = 812;
        seller.created_at = Utc::now() - Duration::days(3);
        repo.save(seller.clone()).await.expect("insert");

        let original_created_at = seller.created_at;
        seller.company_name = Some("Trail Supply LLC".to_string());
        seller.created_at = Utc::now();
        repo.save(seller.clone()).await.expect("update");

        let loaded = repo.find_by_id(&seller.id).await.expect("find").expect("present");
        assert_eq!(loaded.company_name.as_deref(), Some("Trail Supply LLC"));
        assert_eq!(loaded.rating, Some(4.6));
        assert_eq!(loaded.total_reviews, 812);
        assert_eq!(loaded.created_at.timestamp_micros(), original_created_at.timestamp_micros());
    }

    #[tokio::test]
    async fn search_covers_company_name_and_filters_combine() {
        let repo = setup().await;
        let mut first = Seller::new("North Goods");
        first.company_name = Some("Polar Holdings".to_string());
        first.validation_status = ValidationStatus::Valid;
        let mut second = Seller::new("Polaris Store");
        second.validation_status = ValidationStatus::Invalid;
        let third = Seller::new("Unrelated");
        for seller in [first.clone(), second, third] {
            repo.save(seller).await.expect("save");
        }

        let polar = SellerFilter { search: Some("polar".to_string()), ..SellerFilter::default() };
        assert_eq!(repo.list(&polar, PageRequest::default()).await.expect("list").total, 2);

        let valid_polar = SellerFilter {
            validation_status: Some(ValidationStatus::Valid),
            ..polar
        };
        let page = repo.list(&valid_polar, PageRequest::default()).await.expect("list");
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].id, first.id);
    }

    #[tokio::test]
    async fn duplicate_flag_round_trips() {
        let repo = setup().await;
        let seller = Seller::new("Echo Traders");
        repo.save(seller.clone()).await.expect("save");

        assert!(repo.set_duplicate_flag(&seller.id, true).await.expect("flag"));
        let flagged = repo.find_by_id(&seller.id).await.expect("find").expect("present");
        assert!(flagged.is_duplicate);
        assert!(flagged.updated_at >= seller.updated_at);

        assert!(repo.set_duplicate_flag(&seller.id, false).await.expect("unflag"));
        assert_eq!(repo.all().await.expect("all").len(), 1);

        assert!(repo.delete(&seller.id).await.expect("delete"));
        assert!(repo.find_by_id(&seller.id).await.expect("find").is_none());
    }
}
