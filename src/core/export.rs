use crate::utils::error::Result;
use chrono::NaiveDate;
use serde::Serialize;

/// `{prefix}_{YYYY-MM-DD}.csv`
pub fn dated_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%Y-%m-%d"))
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Serialize `rows` as CSV under an explicit header, so an empty export
/// still carries its column names.
pub fn write_csv<T: Serialize>(columns: &[&str], rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        email: String,
        name: String,
    }

    #[test]
    fn test_dated_filename() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        assert_eq!(
            dated_filename("dmv_subscribers", date),
            "dmv_subscribers_2025-10-01.csv"
        );
    }

    #[test]
    fn test_write_csv_quotes_fields() {
        let rows = vec![Row {
            email: "a@b.org".into(),
            name: "Smith, Jane".into(),
        }];

        let data = write_csv(&["email", "name"], &rows).unwrap();
        assert_eq!(
            String::from_utf8(data).unwrap(),
            "email,name\na@b.org,\"Smith, Jane\"\n"
        );
    }

    #[test]
    fn test_empty_export_keeps_header() {
        let rows: Vec<Row> = Vec::new();
        let data = write_csv(&["email", "name"], &rows).unwrap();
        assert_eq!(String::from_utf8(data).unwrap(), "email,name\n");
    }
}
