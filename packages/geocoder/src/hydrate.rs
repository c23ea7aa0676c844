//! CSV table hydration.
//!
//! Reads a CSV of addresses, resolves every row and writes the table back
//! with the resolved address columns added. A table with `postcode`,
//! `street` (or `street_nominative`) and `house_nr` columns is resolved
//! field by field; any other table must have a free-text address column.

use std::io::{Read, Write};

use stadfang_registry::ResolvedAddress;

use crate::{Geocoder, QueryError, structured::StructuredQuery};

/// Columns written for every row. Existing columns with these names are
/// overwritten in place, the rest are appended.
pub const OUTPUT_COLUMNS: [&str; 8] = [
    "municipality",
    "postcode",
    "street_nominative",
    "street_dative",
    "house_nr",
    "special_name",
    "lat",
    "lon",
];

/// Options for [`hydrate_csv`].
#[derive(Debug, Clone)]
pub struct HydrateOptions {
    /// Free-text address column, used when the table is not structured.
    pub column: String,
    /// Field delimiter of both input and output.
    pub delimiter: u8,
}

impl Default for HydrateOptions {
    fn default() -> Self {
        Self {
            column: "address".to_string(),
            delimiter: b',',
        }
    }
}

/// Row counts of a hydration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HydrateSummary {
    pub rows: usize,
    pub resolved: usize,
}

/// Resolves the addresses of a CSV table and writes the hydrated table.
///
/// # Errors
///
/// Returns [`QueryError::MissingColumn`] if the table is neither
/// structured nor has the address column, [`QueryError::RaggedRow`] if a
/// row has more fields than the header, or a CSV/I/O error. Short rows
/// are padded.
pub fn hydrate_csv(
    geocoder: &Geocoder,
    reader: impl Read,
    writer: impl Write,
    options: &HydrateOptions,
) -> Result<HydrateSummary, QueryError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(ToString::to_string).collect();
    let rows = csv_reader.records().collect::<Result<Vec<_>, _>>()?;

    if let Some(row) = rows.iter().find(|row| row.len() > headers.len()) {
        return Err(QueryError::RaggedRow {
            line: row.position().map_or(0, csv::Position::line),
            expected: headers.len(),
            actual: row.len(),
        });
    }

    let index_of = |name: &str| headers.iter().position(|h| h == name);
    let field = |row: &csv::StringRecord, i: usize| row.get(i).unwrap_or_default().to_string();

    let resolved = match (
        index_of("postcode"),
        index_of("street_nominative").or_else(|| index_of("street")),
        index_of("house_nr"),
    ) {
        (Some(postcode), Some(street), Some(house_nr)) => {
            log::info!("Hydrating {} structured rows", rows.len());
            let municipality = index_of("municipality");
            let queries: Vec<StructuredQuery> = rows
                .iter()
                .map(|row| StructuredQuery {
                    postcode: field(row, postcode),
                    street: field(row, street),
                    house_nr: field(row, house_nr),
                    municipality: municipality
                        .map(|i| field(row, i))
                        .filter(|m| !m.trim().is_empty()),
                })
                .collect();
            geocoder.resolve_structured(&queries)
        }
        _ => {
            let column = index_of(&options.column).ok_or_else(|| QueryError::MissingColumn {
                column: options.column.clone(),
            })?;
            log::info!("Hydrating {} rows from column {:?}", rows.len(), options.column);
            let texts: Vec<&str> = rows
                .iter()
                .map(|row| row.get(column).unwrap_or_default())
                .collect();
            geocoder.resolve_text(&texts)
        }
    };

    let mut output_headers = headers.clone();
    let positions: Vec<usize> = OUTPUT_COLUMNS
        .iter()
        .map(|name| {
            index_of(name).unwrap_or_else(|| {
                output_headers.push((*name).to_string());
                output_headers.len() - 1
            })
        })
        .collect();

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    csv_writer.write_record(&output_headers)?;

    let mut summary = HydrateSummary {
        rows: rows.len(),
        resolved: 0,
    };

    for (row, address) in rows.iter().zip(&resolved) {
        let mut fields: Vec<String> = row.iter().map(ToString::to_string).collect();
        fields.resize(output_headers.len(), String::new());
        for (position, value) in positions.iter().zip(output_values(address)) {
            fields[*position] = value;
        }
        csv_writer.write_record(&fields)?;

        if address.is_resolved() {
            summary.resolved += 1;
        }
    }

    csv_writer.flush()?;

    log::info!(
        "Hydrated {} rows, {} resolved",
        summary.rows,
        summary.resolved
    );

    Ok(summary)
}

fn output_values(address: &ResolvedAddress) -> [String; 8] {
    let (lat, lon) = address
        .coordinates
        .map(|c| (c.lat.to_string(), c.lon.to_string()))
        .unwrap_or_default();

    [
        address.municipality.clone(),
        address.postcode.clone(),
        address.street_nominative.clone(),
        address.street_dative.clone(),
        address.house_nr.clone(),
        address.special_name.clone(),
        lat,
        lon,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::geocoder;

    fn hydrate(input: &str) -> Result<(String, HydrateSummary), QueryError> {
        let mut out = Vec::new();
        let summary = hydrate_csv(
            &geocoder(),
            input.as_bytes(),
            &mut out,
            &HydrateOptions::default(),
        )?;
        Ok((String::from_utf8(out).unwrap(), summary))
    }

    #[test]
    fn hydrates_text_column() {
        let (out, summary) = hydrate(
            "id,address\n\
             1,\"Laugavegur 22, 101 Reykjavík\"\n\
             2,Heimilisfang vantar\n",
        )
        .unwrap();

        assert_eq!(summary, HydrateSummary { rows: 2, resolved: 1 });

        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some(
                "id,address,municipality,postcode,street_nominative,street_dative,house_nr,\
                 special_name,lat,lon"
            )
        );
        assert_eq!(
            lines.next(),
            Some(
                "1,\"Laugavegur 22, 101 Reykjavík\",Reykjavík,101,Laugavegur,Laugavegi,22,,\
                 64.145,-21.93"
            )
        );
        assert_eq!(lines.next(), Some("2,Heimilisfang vantar,,,,,,,,"));
    }

    #[test]
    fn hydrates_structured_columns_in_place() {
        let (out, summary) = hydrate(
            "postcode,street,house_nr\n\
             112,Funafold,95\n\
             101,Laugavegi,11\n",
        )
        .unwrap();

        assert_eq!(summary.resolved, 2);

        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some(
                "postcode,street,house_nr,municipality,street_nominative,street_dative,\
                 special_name,lat,lon"
            )
        );
        assert_eq!(
            lines.next(),
            Some("112,Funafold,95,Reykjavík,Funafold,Funafold,,64.137,-21.79")
        );
        assert_eq!(
            lines.next(),
            Some("101,Laugavegi,11,Reykjavík,Laugavegur,Laugavegi,,64.146,-21.932")
        );
    }

    #[test]
    fn missing_address_column_is_an_error() {
        let err = hydrate("id,text\n1,Laugavegur 22\n").unwrap_err();
        assert!(matches!(err, QueryError::MissingColumn { column } if column == "address"));
    }

    #[test]
    fn short_rows_are_padded() {
        let (out, summary) = hydrate("id,address,note\n1,\"Funafold 95, 112\"\n").unwrap();
        assert_eq!(summary.resolved, 1);
        assert_eq!(
            out.lines().nth(1),
            Some("1,\"Funafold 95, 112\",,Reykjavík,112,Funafold,Funafold,95,,64.137,-21.79")
        );
    }

    #[test]
    fn rows_longer_than_header_are_rejected() {
        let err = hydrate(
            "id,address\n\
             1,\"Funafold 95, 112\"\n\
             2,\"Laugavegur 22, 101\",extra\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            QueryError::RaggedRow {
                line: 3,
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn custom_column_and_delimiter() {
        let mut out = Vec::new();
        let options = HydrateOptions {
            column: "heimilisfang".to_string(),
            delimiter: b';',
        };
        let summary = hydrate_csv(
            &geocoder(),
            "heimilisfang\nFunafold 95, 112\n".as_bytes(),
            &mut out,
            &options,
        )
        .unwrap();
        assert_eq!(summary.resolved, 1);
        let out = String::from_utf8(out).unwrap();
        assert!(out.lines().nth(1).unwrap().contains(";Reykjavík;112;Funafold;Funafold;95;"));
    }
}
