use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use sea_orm::sea_query::{Expr, ExprTrait, LikeExpr};

use super::{DaoBase, DaoLayerError, DaoResult, PaginatedResponse};
use crate::db::entities::{
    ListingStatus, category,
    listing::{self, Entity as Listing},
};

const LIKE_ESCAPE: char = '\\';

#[derive(Debug, Clone)]
pub struct NewListing {
    pub owner_id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub condition: Option<String>,
    pub color: Option<String>,
}

/// Filters for a listing search. Empty text matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub text: Option<String>,
    pub category_id: Option<i64>,
}

impl ListingQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            category_id: None,
        }
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Price buckets for the deals feed, in cents, upper bound exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBand {
    Under5,
    From5To10,
    From10To25,
}

impl PriceBand {
    pub const ALL: [PriceBand; 3] = [PriceBand::Under5, PriceBand::From5To10, PriceBand::From10To25];

    pub fn bounds(self) -> (i64, i64) {
        match self {
            PriceBand::Under5 => (0, 500),
            PriceBand::From5To10 => (500, 1_000),
            PriceBand::From10To25 => (1_000, 2_500),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceBand::Under5 => "Under $5",
            PriceBand::From5To10 => "$5 - $10",
            PriceBand::From10To25 => "$10 - $25",
        }
    }
}

#[derive(Clone)]
pub struct ListingDao {
    db: DatabaseConnection,
}

impl DaoBase for ListingDao {
    type Entity = Listing;
    const ENTITY_NAME: &'static str = "listing";

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl ListingDao {
    pub async fn create_listing(&self, new: NewListing) -> DaoResult<listing::Model> {
        let model = listing::ActiveModel {
            owner_id: Set(new.owner_id),
            category_id: Set(new.category_id),
            title: Set(new.title),
            description: Set(new.description),
            price_cents: Set(new.price_cents),
            condition: Set(new.condition),
            color: Set(new.color),
            status: Set(ListingStatus::Active.as_str().to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model.insert(&self.db).await.map_err(DaoLayerError::Db)
    }

    pub async fn find_by_id(&self, id: i64) -> DaoResult<listing::Model> {
        Self::find_in(&self.db, id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn find_in<C: ConnectionTrait>(
        conn: &C,
        id: i64,
    ) -> DaoResult<Option<listing::Model>> {
        Ok(Listing::find_by_id(id).one(conn).await?)
    }

    /// Moves `id` from `from` to `to` only if it is still in `from`.
    /// Returns false when another writer changed the status first.
    pub async fn compare_and_set_status_in<C: ConnectionTrait>(
        conn: &C,
        id: i64,
        from: ListingStatus,
        to: ListingStatus,
    ) -> DaoResult<bool> {
        let result = Listing::update_many()
            .col_expr(listing::Column::Status, Expr::value(to.as_str()))
            .filter(listing::Column::Id.eq(id))
            .filter(listing::Column::Status.eq(from.as_str()))
            .exec(conn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    pub fn search(&self, query: ListingQuery, page_size: u64) -> ListingSearch {
        ListingSearch {
            dao: self.clone(),
            query,
            page: 1,
            page_size,
            done: false,
        }
    }

    pub async fn search_page(
        &self,
        query: &ListingQuery,
        page: u64,
        page_size: u64,
    ) -> DaoResult<PaginatedResponse<listing::Model>> {
        self.find_page(page, page_size, search_select(query)).await
    }

    pub async fn cheapest_in_band(
        &self,
        band: PriceBand,
        limit: u64,
    ) -> DaoResult<Vec<listing::Model>> {
        let (min, max) = band.bounds();
        Ok(active()
            .filter(listing::Column::PriceCents.gte(min))
            .filter(listing::Column::PriceCents.lt(max))
            .order_by_asc(listing::Column::PriceCents)
            .order_by_asc(listing::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    /// Newest first, any status.
    pub async fn recent_by_owner(&self, owner_id: i64, limit: u64) -> DaoResult<Vec<listing::Model>> {
        Ok(Listing::find()
            .filter(listing::Column::OwnerId.eq(owner_id))
            .order_by_desc(listing::Column::CreatedAt)
            .order_by_desc(listing::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    pub async fn count_by_owner(
        &self,
        owner_id: i64,
        status: Option<ListingStatus>,
    ) -> DaoResult<u64> {
        let mut select = Listing::find().filter(listing::Column::OwnerId.eq(owner_id));
        if let Some(status) = status {
            select = select.filter(listing::Column::Status.eq(status.as_str()));
        }
        Ok(select.count(&self.db).await?)
    }
}

/// Lazy, restartable cursor over a search. Each `next_page` call runs one
/// query; the sequence ends after the first short page.
pub struct ListingSearch {
    dao: ListingDao,
    query: ListingQuery,
    page: u64,
    page_size: u64,
    done: bool,
}

impl ListingSearch {
    pub fn query(&self) -> &ListingQuery {
        &self.query
    }

    pub async fn next_page(&mut self) -> DaoResult<Option<PaginatedResponse<listing::Model>>> {
        if self.done {
            return Ok(None);
        }

        let response = self
            .dao
            .search_page(&self.query, self.page, self.page_size)
            .await?;

        if !response.has_next {
            self.done = true;
        }
        self.page = self.page.saturating_add(1);

        Ok(Some(response))
    }

    pub fn restart(&mut self) {
        self.page = 1;
        self.done = false;
    }

    /// Drains the sequence from the start.
    pub async fn collect_all(&mut self) -> DaoResult<Vec<listing::Model>> {
        self.restart();
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page.data);
        }
        Ok(all)
    }
}

fn active() -> Select<Listing> {
    Listing::find().filter(listing::Column::Status.eq(ListingStatus::Active.as_str()))
}

fn search_select(query: &ListingQuery) -> Select<Listing> {
    let mut select = active();

    if let Some(category_id) = query.category_id {
        select = select.filter(listing::Column::CategoryId.eq(category_id));
    }

    if let Some(text) = query.trimmed_text() {
        let pattern = like_pattern(text);
        let matches = |column: Expr| column.like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE));
        select = select
            .join(JoinType::InnerJoin, listing::Relation::Category.def())
            .filter(
                Condition::any()
                    .add(matches(Expr::col((listing::Entity, listing::Column::Title))))
                    .add(matches(Expr::col((listing::Entity, listing::Column::Description))))
                    .add(matches(Expr::col((category::Entity, category::Column::Name)))),
            );
    }

    select
        .order_by_desc(listing::Column::CreatedAt)
        .order_by_desc(listing::Column::Id)
}

/// `%text%` with LIKE metacharacters escaped.
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, QueryTrait};

    use super::{ListingQuery, PriceBand, like_pattern, search_select};

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(like_pattern("lamp"), "%lamp%");
    }

    #[test]
    fn empty_text_skips_the_category_join() {
        let sql = search_select(&ListingQuery::text("   ").in_category(2))
            .build(DbBackend::Sqlite)
            .to_string();

        assert!(!sql.contains("JOIN"), "unexpected join: {sql}");
        assert!(sql.contains("\"category_id\" = 2"), "missing filter: {sql}");
        let order_by = sql.find("ORDER BY").expect("query should be ordered");
        assert!(sql[order_by..].contains("\"created_at\" DESC"), "{sql}");
    }

    #[test]
    fn text_matches_title_description_and_category_name() {
        let sql = search_select(&ListingQuery::text("desk"))
            .build(DbBackend::Sqlite)
            .to_string();

        assert!(sql.contains("INNER JOIN \"categories\""), "missing join: {sql}");
        assert!(sql.contains("\"listings\".\"title\" LIKE '%desk%'"), "{sql}");
        assert!(sql.contains("\"categories\".\"name\" LIKE '%desk%'"), "{sql}");
    }

    #[test]
    fn price_bands_are_contiguous() {
        let bounds: Vec<_> = PriceBand::ALL.iter().map(|band| band.bounds()).collect();
        for pair in bounds.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }
}
