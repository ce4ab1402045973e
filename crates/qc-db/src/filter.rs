use crate::{
    schema::qc::{shipments, shipped_units},
    types::ShipmentStatus,
};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

/// Recognised shipment filter keys. Every shipment listing and report resolves its
/// filter to an ordered list of shipment ids first, so they all share one predicate.
#[derive(Clone, Debug, Default)]
pub struct ShipmentFilter {
    pub search: Option<String>,
    pub customer: Option<String>,
    pub start_date: Option<jiff::civil::Date>,
    pub end_date: Option<jiff::civil::Date>,
    pub status: Option<ShipmentStatus>,
}

impl ShipmentFilter {
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// A text search spans all dates, so the date range is dropped while searching.
    pub fn dates_unless_searching(mut self) -> Self {
        if self.search_term().is_some() {
            self.start_date = None;
            self.end_date = None;
        }
        self
    }
}

/// Turns user text into an ILIKE pattern matching it literally anywhere in a value.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Ids of the shipments matching `filter`, newest shipping date first.
pub(crate) async fn matching_shipment_ids(
    conn: &mut AsyncPgConnection,
    filter: &ShipmentFilter,
) -> Result<Vec<i32>, diesel::result::Error> {
    let mut query = shipments::table
        .select(shipments::id)
        .order((shipments::shipping_date.desc(), shipments::id.desc()))
        .into_boxed();
    if let Some(term) = filter.search_term() {
        let pattern = like_pattern(term);
        let matching_units = shipped_units::table
            .select(shipped_units::shipment_id)
            .filter(
                shipped_units::serial_number
                    .ilike(pattern.clone())
                    .or(shipped_units::original_serial_number
                        .assume_not_null()
                        .ilike(pattern.clone()))
                    .or(shipped_units::part_number.ilike(pattern.clone()))
                    .or(shipped_units::model_type.ilike(pattern.clone())),
            );
        query = query.filter(
            shipments::job_number
                .ilike(pattern.clone())
                .or(shipments::customer_name.ilike(pattern))
                .or(shipments::id.eq_any(matching_units)),
        );
    } else if let Some(customer) = filter
        .customer
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        query = query.filter(shipments::customer_name.ilike(like_pattern(customer)));
    }
    if let Some(start_date) = filter.start_date {
        query = query.filter(shipments::shipping_date.ge(jiff_diesel::Date::from(start_date)));
    }
    if let Some(end_date) = filter.end_date {
        query = query.filter(shipments::shipping_date.le(jiff_diesel::Date::from(end_date)));
    }
    if let Some(status) = filter.status {
        query = query.filter(shipments::status.eq(status.as_str()));
    }
    query.load(conn).await
}

/// Units of `shipment_ids` that the filter's search selects. A shipment whose job number
/// or customer matches contributes every unit; otherwise only units matching on their
/// own columns count. Without a search every unit is returned.
pub(crate) async fn matching_unit_ids(
    conn: &mut AsyncPgConnection,
    shipment_ids: Vec<i32>,
    filter: &ShipmentFilter,
) -> Result<Vec<i32>, diesel::result::Error> {
    let mut query = shipped_units::table
        .inner_join(shipments::table)
        .filter(shipped_units::shipment_id.eq_any(shipment_ids))
        .select(shipped_units::unit_id)
        .order(shipped_units::unit_id)
        .into_boxed();
    if let Some(term) = filter.search_term() {
        let pattern = like_pattern(term);
        query = query.filter(
            shipments::job_number
                .ilike(pattern.clone())
                .or(shipments::customer_name.ilike(pattern.clone()))
                .or(shipped_units::serial_number.ilike(pattern.clone()))
                .or(shipped_units::original_serial_number
                    .assume_not_null()
                    .ilike(pattern.clone()))
                .or(shipped_units::part_number.ilike(pattern.clone()))
                .or(shipped_units::model_type.ilike(pattern)),
        );
    }
    query.load(conn).await
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub limit: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(number: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> usize {
        usize::try_from((self.number - 1).saturating_mul(self.limit)).unwrap_or(usize::MAX)
    }

    pub fn total_pages(&self, total_records: usize) -> i64 {
        (total_records as i64 + self.limit - 1) / self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_matched_literally() {
        assert_eq!(like_pattern("ACME"), "%ACME%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn searching_drops_the_date_range() {
        let dated = ShipmentFilter {
            search: Some("  ".to_owned()),
            start_date: Some(jiff::civil::date(2024, 1, 1)),
            end_date: Some(jiff::civil::date(2024, 1, 31)),
            ..Default::default()
        };
        let kept = dated.clone().dates_unless_searching();
        assert!(kept.start_date.is_some(), "blank search is no search");

        let searching = ShipmentFilter {
            search: Some("J-100".to_owned()),
            ..dated
        }
        .dates_unless_searching();
        assert_eq!(searching.search_term(), Some("J-100"));
        assert!(searching.start_date.is_none());
        assert!(searching.end_date.is_none());
    }

    #[test]
    fn pages_are_clamped_and_counted() {
        let page = Page::new(None, None);
        assert_eq!(page, Page { number: 1, limit: 10 });
        assert_eq!(page.offset(), 0);
        assert_eq!(Page::new(Some(0), Some(1000)), Page { number: 1, limit: 100 });
        let third = Page::new(Some(3), Some(25));
        assert_eq!(third.offset(), 50);
        assert_eq!(third.total_pages(0), 0);
        assert_eq!(third.total_pages(25), 1);
        assert_eq!(third.total_pages(26), 2);
    }

    #[test]
    fn huge_page_numbers_skip_everything() {
        let page = Page::new(Some(i64::MAX), Some(100));
        assert_eq!(page.number, i64::MAX);
        assert_eq!(page.offset(), usize::try_from(i64::MAX).unwrap_or(usize::MAX));
        assert_eq!((0..5).skip(page.offset()).count(), 0);
    }
}
