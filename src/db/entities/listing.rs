use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner_id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub condition: Option<String>,
    pub color: Option<String>,
    pub status: String,
    pub created_at: DateTimeUtc,
}

impl Model {
    pub fn status(&self) -> Option<ListingStatus> {
        ListingStatus::try_from(self.status.as_str()).ok()
    }

    pub fn is_active(&self) -> bool {
        self.status() == Some(ListingStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Sold,
    Removed,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
            ListingStatus::Removed => "removed",
        }
    }

    /// Only `active` may move, and only forward. `sold` and `removed` are terminal.
    pub fn can_transition_to(self, next: ListingStatus) -> bool {
        matches!(
            (self, next),
            (ListingStatus::Active, ListingStatus::Sold)
                | (ListingStatus::Active, ListingStatus::Removed)
        )
    }
}

impl TryFrom<&str> for ListingStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(ListingStatus::Active),
            "sold" => Ok(ListingStatus::Sold),
            "removed" => Ok(ListingStatus::Removed),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Restrict"
    )]
    Category,
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItem,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::ListingStatus;

    #[test]
    fn status_string_roundtrip() {
        for status in [ListingStatus::Active, ListingStatus::Sold, ListingStatus::Removed] {
            assert_eq!(ListingStatus::try_from(status.as_str()), Ok(status));
        }
        assert!(ListingStatus::try_from("archived").is_err());
    }

    #[test]
    fn transitions_are_one_directional() {
        use ListingStatus::*;

        assert!(Active.can_transition_to(Sold));
        assert!(Active.can_transition_to(Removed));
        assert!(!Active.can_transition_to(Active));
        assert!(!Sold.can_transition_to(Active));
        assert!(!Sold.can_transition_to(Removed));
        assert!(!Removed.can_transition_to(Active));
        assert!(!Removed.can_transition_to(Sold));
    }
}
