use serde::Serialize;

use crate::data::fields::NumericField;
use crate::data::filter::BookingView;
use crate::error::{AnalysisError, AnalysisResult};

/// Symmetric Pearson correlation matrix.
///
/// `values[i][j]` is the correlation of `fields[i]` with `fields[j]`, or
/// `None` when undefined (fewer than two paired observations or a field
/// without variance on those observations).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub fields: Vec<NumericField>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: NumericField, b: NumericField) -> Option<f64> {
        let i = self.fields.iter().position(|f| *f == a)?;
        let j = self.fields.iter().position(|f| *f == b)?;
        self.values[i][j]
    }

    /// Correlations of `field` with every other field.
    pub fn row(&self, field: NumericField) -> Vec<(NumericField, Option<f64>)> {
        self.fields
            .iter()
            .filter(|f| **f != field)
            .map(|f| (*f, self.get(field, *f)))
            .collect()
    }
}

/// Pairwise Pearson correlation over `fields`.
///
/// Fields the store does not provide, or that have no value anywhere in the
/// view, are left out. Each pair uses the records where both values exist.
pub fn correlation_matrix(
    view: &BookingView<'_>,
    fields: &[NumericField],
) -> AnalysisResult<CorrelationMatrix> {
    view.ensure_data()?;

    let mut usable: Vec<NumericField> = Vec::new();
    for field in fields {
        if usable.contains(field) || !view.store().provides(field.source()) {
            continue;
        }
        if view.iter().any(|rec| field.value(rec).is_some()) {
            usable.push(*field);
        }
    }
    if usable.len() < 2 {
        return Err(AnalysisError::InsufficientFields(usable.len()));
    }

    let columns: Vec<Vec<Option<f64>>> = usable
        .iter()
        .map(|field| view.iter().map(|rec| field.value(rec)).collect())
        .collect();

    let n = usable.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let pairs = columns[i]
                .iter()
                .zip(&columns[j])
                .filter_map(|(x, y)| x.zip(*y));
            let r = if i == j {
                pearson(pairs).map(|_| 1.0)
            } else {
                pearson(pairs)
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        fields: usable,
        values,
    })
}

/// Pearson's r, clamped into [-1, 1]. `None` below two observations or
/// when either side is constant.
pub fn pearson(pairs: impl Iterator<Item = (f64, f64)> + Clone) -> Option<f64> {
    let (n, sum_x, sum_y) = pairs
        .clone()
        .fold((0usize, 0.0, 0.0), |(n, sx, sy), (x, y)| (n + 1, sx + x, sy + y));
    if n < 2 {
        return None;
    }
    let mean_x = sum_x / n as f64;
    let mean_y = sum_y / n as f64;

    let (sxx, syy, sxy) = pairs.fold((0.0, 0.0, 0.0), |(sxx, syy, sxy), (x, y)| {
        let dx = x - mean_x;
        let dy = y - mean_y;
        (sxx + dx * dx, syy + dy * dy, sxy + dx * dy)
    });
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    let r = sxy / (sxx * syy).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::derive_features;
    use crate::data::fields::Column;
    use crate::data::model::{BookingRecord, BookingStore};

    fn store() -> BookingStore {
        let rows = [
            (true, 300, 60.0, Some(0)),
            (true, 250, 80.0, Some(0)),
            (false, 10, 120.0, Some(2)),
            (false, 40, 95.0, Some(1)),
            (true, 120, 70.0, None),
        ];
        let records = rows
            .iter()
            .map(|(canceled, lead, adr, requests)| {
                let mut rec = BookingRecord::new("City Hotel", *canceled, *lead, *adr);
                rec.total_of_special_requests = *requests;
                rec
            })
            .collect();
        let mut schema: std::collections::BTreeSet<Column> =
            Column::REQUIRED.into_iter().collect();
        schema.insert(Column::TotalOfSpecialRequests);
        let mut store = BookingStore::from_records(records, schema);
        derive_features(&mut store);
        store
    }

    const FIELDS: [NumericField; 5] = [
        NumericField::IsCanceled,
        NumericField::LeadTime,
        NumericField::Adr,
        NumericField::TotalOfSpecialRequests,
        NumericField::TotalNights,
    ];

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let store = store();
        let m = correlation_matrix(&BookingView::all(&store), &FIELDS).unwrap();

        // total_nights is not derivable without the stay columns.
        assert_eq!(m.fields.len(), 4);
        for i in 0..m.fields.len() {
            assert_eq!(m.values[i][i], Some(1.0));
            for j in 0..m.fields.len() {
                assert_eq!(m.values[i][j], m.values[j][i]);
                if let Some(r) = m.values[i][j] {
                    assert!((-1.0..=1.0).contains(&r));
                }
            }
        }
        assert!(m.get(NumericField::IsCanceled, NumericField::LeadTime).unwrap() > 0.8);
        assert!(m.get(NumericField::IsCanceled, NumericField::Adr).unwrap() < 0.0);
    }

    #[test]
    fn perfectly_linear_fields_correlate_to_one() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let pairs = xs.iter().map(|x| (*x, 2.0 * x + 1.0));
        assert!((pearson(pairs).unwrap() - 1.0).abs() < 1e-12);

        let pairs = xs.iter().map(|x| (*x, -x));
        assert!((pearson(pairs).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_field_is_undefined() {
        let pairs = [(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)].into_iter();
        assert_eq!(pearson(pairs), None);
        assert_eq!(pearson([(1.0, 2.0)].into_iter()), None);
    }

    #[test]
    fn key_row_excludes_self() {
        let store = store();
        let m = correlation_matrix(&BookingView::all(&store), &FIELDS).unwrap();
        let row = m.row(NumericField::IsCanceled);
        assert_eq!(row.len(), 3);
        assert!(row.iter().all(|(f, _)| *f != NumericField::IsCanceled));
    }

    #[test]
    fn too_few_fields_and_empty_view() {
        let store = store();
        let view = BookingView::all(&store);
        assert_eq!(
            correlation_matrix(&view, &[NumericField::Adr, NumericField::TotalGuests]),
            Err(AnalysisError::InsufficientFields(1))
        );

        let empty = BookingView::from_indices(&store, &[]);
        assert_eq!(correlation_matrix(&empty, &FIELDS), Err(AnalysisError::NoData));
    }
}
