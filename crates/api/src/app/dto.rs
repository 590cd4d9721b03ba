use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use secrecy::SecretString;
use serde::Deserialize;

use depot_audit::{ActionKind, LogFilter, Pagination};
use depot_core::{Amount, DomainError, GoodsTypeId, MenuId, RoleId};
use depot_parties::ContactInfo;
use depot_purchasing::{DocumentFilter, LineItemFilter, NewDocument, NewLineItem, SettlementState};

use crate::app::errors::ApiError;

// -------------------------
// Parsing helpers
// -------------------------

/// `YYYY-MM-DD`; blank means "not supplied".
pub fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::validation(format!("{field} must be a YYYY-MM-DD date, got '{s}'"))),
    }
}

pub fn require_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    parse_date(field, Some(raw))?.ok_or_else(|| ApiError::validation(format!("{field} is required")))
}

fn parse_timestamp(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| ApiError::validation(format!("{field} must be an RFC 3339 timestamp"))),
    }
}

pub fn parse_id<T>(field: &str, raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.trim()
        .parse()
        .map_err(|_| ApiError::new(axum::http::StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {field}")))
}

pub fn parse_opt_id<T>(field: &str, raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_id(field, s))
        .transpose()
}

fn parse_state(raw: Option<&str>) -> Result<Option<SettlementState>, ApiError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| SettlementState::parse(s).map_err(|e| ApiError::validation(e.to_string())))
        .transpose()
}

// -------------------------
// Auth
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecretString,
}

// -------------------------
// Documents (purchases and returns)
// -------------------------

/// Header list query. The party id is accepted as `supplier_id` or
/// `customer_id` depending on the document kind.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentListQuery {
    pub number: Option<String>,
    #[serde(alias = "supplier_id", alias = "customer_id")]
    pub party_id: Option<String>,
    pub state: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DocumentListQuery {
    pub fn into_filter<P>(self) -> Result<DocumentFilter<P>, ApiError>
    where
        P: FromStr<Err = DomainError>,
    {
        Ok(DocumentFilter {
            number: self.number.filter(|n| !n.trim().is_empty()),
            party_id: parse_opt_id("party id", self.party_id.as_deref())?,
            state: parse_state(self.state.as_deref())?,
            start: parse_date("start", self.start.as_deref())?,
            end: parse_date("end", self.end.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveHeaderRequest {
    pub number: String,
    #[serde(alias = "supplier_id", alias = "customer_id")]
    pub party_id: String,
    pub date: String,
    pub amount_payable: Amount,
    pub state: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl SaveHeaderRequest {
    pub fn into_draft<P>(self) -> Result<NewDocument<P>, ApiError>
    where
        P: FromStr<Err = DomainError>,
    {
        Ok(NewDocument {
            number: self.number,
            party_id: parse_id("party id", &self.party_id)?,
            date: require_date("date", &self.date)?,
            amount_payable: self.amount_payable,
            state: parse_state(Some(&self.state))?.ok_or_else(|| ApiError::validation("state is required"))?,
            remarks: self.remarks,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SavePurchaseRequest {
    #[serde(flatten)]
    pub header: SaveHeaderRequest,
    pub lines: Vec<NewLineItem>,
}

#[derive(Debug, Deserialize)]
pub struct IdRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct StateRequest {
    pub id: String,
    pub state: String,
}

impl StateRequest {
    pub fn state(&self) -> Result<SettlementState, ApiError> {
        SettlementState::parse(&self.state).map_err(|e| ApiError::validation(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct LineItemsQuery {
    pub purchase_list_id: String,
    pub type_id: Option<String>,
    pub code_or_name: Option<String>,
}

impl LineItemsQuery {
    pub fn line_filter(&self) -> Result<LineItemFilter, ApiError> {
        line_filter(self.type_id.as_deref(), self.code_or_name.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub type_id: Option<String>,
    pub code_or_name: Option<String>,
}

impl ReportQuery {
    pub fn line_filter(&self) -> Result<LineItemFilter, ApiError> {
        line_filter(self.type_id.as_deref(), self.code_or_name.as_deref())
    }
}

fn line_filter(type_id: Option<&str>, code_or_name: Option<&str>) -> Result<LineItemFilter, ApiError> {
    Ok(LineItemFilter {
        type_id: parse_opt_id::<GoodsTypeId>("goods type id", type_id)?,
        code_or_name: code_or_name.map(str::to_string),
    })
}

/// Missing `date` means today (UTC).
#[derive(Debug, Default, Deserialize)]
pub struct NumberQuery {
    pub date: Option<String>,
}

impl NumberQuery {
    pub fn date(&self) -> Result<NaiveDate, ApiError> {
        Ok(parse_date("date", self.date.as_deref())?.unwrap_or_else(|| Utc::now().date_naive()))
    }
}

// -------------------------
// Catalog
// -------------------------

#[derive(Debug, Deserialize)]
pub struct PartyRequest {
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoodsTypeRequest {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<GoodsTypeId>,
}

// -------------------------
// Administration
// -------------------------

#[derive(Debug, Deserialize)]
pub struct EnabledRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct RoleIdsRequest {
    pub role_ids: Vec<RoleId>,
}

#[derive(Debug, Deserialize)]
pub struct MenuIdsRequest {
    pub menu_ids: Vec<MenuId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub kind: Option<String>,
    pub username: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl LogQuery {
    pub fn into_parts(self) -> Result<(LogFilter, Pagination), ApiError> {
        let kind = self
            .kind
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| k.parse::<ActionKind>().map_err(|e| ApiError::validation(e.to_string())))
            .transpose()?;
        let filter = LogFilter {
            kind,
            username: self.username.filter(|u| !u.trim().is_empty()),
            occurred_after: parse_timestamp("after", self.after.as_deref())?,
            occurred_before: parse_timestamp("before", self.before.as_deref())?,
        };
        Ok((filter, Pagination::new(self.limit, self.offset)))
    }
}
