//! Address normalization
//!
//! Projects the provider's address components onto [`AddressDetail`].

use crate::geo::google::GeocodeResult;
use crate::geo::{AddressDetail, Enrichment};
use std::collections::HashMap;

/// Which of a component's names to read
#[derive(Debug, Clone, Copy)]
enum NameForm {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy)]
enum AddressField {
    Street,
    Neighborhood,
    Town,
    City,
    Region,
    Country,
    CountryCode,
    PostalCode,
    StreetNumber,
}

/// Category tag → canonical field
const FIELD_TABLE: &[(&str, NameForm, AddressField)] = &[
    ("route", NameForm::Long, AddressField::Street),
    ("neighborhood", NameForm::Long, AddressField::Neighborhood),
    ("sublocality", NameForm::Long, AddressField::Town),
    ("locality", NameForm::Long, AddressField::City),
    ("administrative_area_level_1", NameForm::Short, AddressField::Region),
    ("country", NameForm::Long, AddressField::Country),
    ("country", NameForm::Short, AddressField::CountryCode),
    ("postal_code", NameForm::Long, AddressField::PostalCode),
    ("street_number", NameForm::Long, AddressField::StreetNumber),
];

fn slot(address: &mut AddressDetail, field: AddressField) -> &mut String {
    match field {
        AddressField::Street => &mut address.street,
        AddressField::Neighborhood => &mut address.neighborhood,
        AddressField::Town => &mut address.town,
        AddressField::City => &mut address.city,
        AddressField::Region => &mut address.region,
        AddressField::Country => &mut address.country,
        AddressField::CountryCode => &mut address.country_code,
        AddressField::PostalCode => &mut address.postal_code,
        AddressField::StreetNumber => &mut address.street_number,
    }
}

/// Normalize a reverse-geocode result list
///
/// Only the first result is used. Each component is keyed by its first
/// category tag; a later component with the same key replaces an earlier one.
/// Returns `None` for an empty list.
pub fn normalize(results: &[GeocodeResult]) -> Option<Enrichment> {
    let first = results.first()?;

    let mut names: HashMap<&str, (&str, &str)> = HashMap::new();
    for component in &first.address_components {
        if let Some(category) = component.types.first() {
            names.insert(
                category.as_str(),
                (component.long_name.as_str(), component.short_name.as_str()),
            );
        }
    }

    let mut address = AddressDetail::default();
    for (category, form, field) in FIELD_TABLE {
        if let Some((long, short)) = names.get(category) {
            let value = match form {
                NameForm::Long => long,
                NameForm::Short => short,
            };
            *slot(&mut address, *field) = value.to_string();
        }
    }

    Some(Enrichment {
        formatted_address: first.formatted_address.clone(),
        address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::google::RawAddressComponent;

    fn component(types: &[&str], long: &str, short: &str) -> RawAddressComponent {
        RawAddressComponent {
            long_name: long.to_string(),
            short_name: short.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn result(formatted: &str, components: Vec<RawAddressComponent>) -> GeocodeResult {
        GeocodeResult {
            formatted_address: formatted.to_string(),
            address_components: components,
        }
    }

    #[test]
    fn test_empty_list() {
        assert!(normalize(&[]).is_none());
    }

    #[test]
    fn test_springfield() {
        let results = vec![result(
            "Springfield, USA",
            vec![
                component(&["locality"], "Springfield", "Springfield"),
                component(&["country"], "USA", "US"),
            ],
        )];

        let enrichment = normalize(&results).unwrap();
        let address = enrichment.address;
        assert_eq!(address.city, "Springfield");
        assert_eq!(address.country, "USA");
        assert_eq!(address.country_code, "US");
        assert_eq!(address.street, "");
        assert_eq!(address.neighborhood, "");
        assert_eq!(address.town, "");
        assert_eq!(address.region, "");
        assert_eq!(address.postal_code, "");
        assert_eq!(address.street_number, "");
        assert_eq!(enrichment.formatted_address, "Springfield, USA");
    }

    #[test]
    fn test_full_address() {
        let results = vec![result(
            "1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA",
            vec![
                component(&["street_number"], "1600", "1600"),
                component(&["route"], "Amphitheatre Parkway", "Amphitheatre Pkwy"),
                component(&["neighborhood", "political"], "North Bayshore", "North Bayshore"),
                component(&["sublocality", "political"], "Shoreline", "Shoreline"),
                component(&["locality", "political"], "Mountain View", "Mountain View"),
                component(&["administrative_area_level_2", "political"], "Santa Clara County", "Santa Clara County"),
                component(&["administrative_area_level_1", "political"], "California", "CA"),
                component(&["country", "political"], "United States", "US"),
                component(&["postal_code"], "94043", "94043"),
            ],
        )];

        let address = normalize(&results).unwrap().address;
        assert_eq!(address.street_number, "1600");
        assert_eq!(address.street, "Amphitheatre Parkway");
        assert_eq!(address.neighborhood, "North Bayshore");
        assert_eq!(address.town, "Shoreline");
        assert_eq!(address.city, "Mountain View");
        assert_eq!(address.region, "CA");
        assert_eq!(address.country, "United States");
        assert_eq!(address.country_code, "US");
        assert_eq!(address.postal_code, "94043");
    }

    #[test]
    fn test_first_result_only() {
        let results = vec![
            result("first", vec![component(&["locality"], "Alpha", "A")]),
            result("second", vec![component(&["locality"], "Beta", "B")]),
        ];

        let enrichment = normalize(&results).unwrap();
        assert_eq!(enrichment.formatted_address, "first");
        assert_eq!(enrichment.address.city, "Alpha");
    }

    #[test]
    fn test_last_component_wins_per_category() {
        let results = vec![result(
            "x",
            vec![
                component(&["locality"], "Old", "O"),
                component(&["locality"], "New", "N"),
            ],
        )];

        assert_eq!(normalize(&results).unwrap().address.city, "New");
    }

    #[test]
    fn test_only_first_tag_counts() {
        let results = vec![result(
            "x",
            vec![
                component(&["political", "locality"], "Ignored", "I"),
                component(&[], "Untagged", "U"),
            ],
        )];

        let address = normalize(&results).unwrap().address;
        assert_eq!(address, AddressDetail::default());
    }
}
