//! Session table entity model.
//!
//! Column names are camelCase to match the table layout shared with other
//! session storage implementations.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing one row of the session table.
///
/// # Database Schema
///
/// | Column        | Type               | Notes                                     |
/// |---------------|--------------------|-------------------------------------------|
/// | id            | TEXT (Primary Key) | Session ID                                |
/// | shop          | TEXT               | Tenant the session belongs to             |
/// | state         | VARCHAR            | OAuth state                               |
/// | isOnline      | BOOLEAN            |                                           |
/// | scope         | TEXT               | Unbounded; scope lists exceed 255 chars   |
/// | expires       | BIGINT             | Seconds since the Unix epoch              |
/// | accessToken   | TEXT               | Ciphertext when encryption is configured  |
/// | userId        | BIGINT             | Online sessions only                      |
/// | firstName     | TEXT               |                                           |
/// | lastName      | TEXT               |                                           |
/// | email         | TEXT               |                                           |
/// | accountOwner  | BOOLEAN            |                                           |
/// | locale        | TEXT               |                                           |
/// | collaborator  | BOOLEAN            |                                           |
/// | emailVerified | BOOLEAN            |                                           |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "shopify_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub shop: String,
    pub state: String,
    #[sea_orm(column_name = "isOnline")]
    pub is_online: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub scope: Option<String>,
    pub expires: Option<i64>,
    #[sea_orm(column_name = "accessToken", column_type = "Text", nullable)]
    pub access_token: Option<String>,
    #[sea_orm(column_name = "userId")]
    pub user_id: Option<i64>,
    #[sea_orm(column_name = "firstName", column_type = "Text", nullable)]
    pub first_name: Option<String>,
    #[sea_orm(column_name = "lastName", column_type = "Text", nullable)]
    pub last_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub email: Option<String>,
    #[sea_orm(column_name = "accountOwner")]
    pub account_owner: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub locale: Option<String>,
    pub collaborator: bool,
    #[sea_orm(column_name = "emailVerified")]
    pub email_verified: bool,
}

/// Required enum for Sea-ORM entity relations.
///
/// The session table has no relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
