use std::collections::BTreeSet;

use crate::data::store::{Collection, Field, RecordStore};
use crate::error::StoreError;

/// Union of distinct `field` values over every velocity collection, in
/// lexical order.
pub fn distinct_values<S>(store: &S, field: Field) -> Result<BTreeSet<String>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let mut values = BTreeSet::new();
    for collection in Collection::ALL {
        values.extend(store.distinct(collection, field)?);
    }
    Ok(values)
}

/// One value per line, newline terminated. Empty set → empty body.
pub fn render_list(values: &BTreeSet<String>) -> String {
    values.iter().map(|v| format!("{v}\n")).collect()
}

pub fn authors<S: RecordStore + ?Sized>(store: &S) -> Result<String, StoreError> {
    Ok(render_list(&distinct_values(store, Field::Author)?))
}

pub fn nfos<S: RecordStore + ?Sized>(store: &S) -> Result<String, StoreError> {
    Ok(render_list(&distinct_values(store, Field::Nfo)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{VelocityModel1D, VelocityModel3D, WaveType};
    use crate::data::store::Tables;

    fn tables() -> Tables {
        let mut t = Tables::default();
        t.insert_1d(vec![VelocityModel1D {
            depth: 0.0,
            velocity: 4.8,
            wave_type: WaveType::Vp,
            nfo: "SED".into(),
            author: "kissling".into(),
        }]);
        let node = |author: &str, nfo: &str| VelocityModel3D {
            longitude: 7.0,
            latitude: 46.0,
            depth: 1.0,
            velocity: 5.0,
            r: 1.0,
            nfo: nfo.into(),
            author: author.into(),
        };
        t.insert_3d(WaveType::Vp, vec![node("diehl", "CH")]);
        t.insert_3d(WaveType::Vs, vec![node("diehl", "SED"), node("agostinetti", "INGV")]);
        t
    }

    #[test]
    fn authors_union_all_collections_sorted() {
        let body = authors(&tables()).unwrap();
        assert_eq!(body, "agostinetti\ndiehl\nkissling\n");
    }

    #[test]
    fn nfos_are_deduplicated() {
        assert_eq!(nfos(&tables()).unwrap(), "CH\nINGV\nSED\n");
    }

    #[test]
    fn repeated_calls_are_identical() {
        let t = tables();
        assert_eq!(authors(&t).unwrap(), authors(&t).unwrap());
    }

    #[test]
    fn empty_store_renders_nothing() {
        assert_eq!(authors(&Tables::default()).unwrap(), "");
    }
}
