//! Area-specificity ranking.
//!
//! MusicBrainz artists frequently carry both a `begin-area` (usually the
//! city) and an `area` (usually the country). The ranker assigns each
//! administrative area type a specificity score and picks whichever of
//! the two is more specific, so a city beats its country whenever one is
//! present.

use artist_atlas_source::musicbrainz::Area;

/// Specificity score for an administrative area type.
///
/// Total over all inputs: country=0, subdivision=1, county=2, city-level
/// types=3, unknown types=1, absent=-1.
#[must_use]
pub fn area_specificity(area_type: Option<&str>) -> i8 {
    area_type.map_or(-1, |area_type| match area_type.to_lowercase().as_str() {
        "country" => 0,
        "subdivision" => 1,
        "county" => 2,
        "city" | "municipality" | "district" | "town" | "village" | "island" => 3,
        _ => 1,
    })
}

/// Whether an area type is specific enough to geocode to a single
/// populated place.
#[must_use]
pub fn is_city_level(area_type: Option<&str>) -> bool {
    area_specificity(area_type) >= 3
}

/// Picks the more specific of an artist's `begin-area` and `area`.
///
/// Ties go to `area`: when both are countries for a single-country act
/// the two fields are usually identical anyway.
#[must_use]
pub fn choose_best_area(begin_area: Option<Area>, area: Option<Area>) -> Option<Area> {
    match (begin_area, area) {
        (None, None) => None,
        (Some(begin_area), None) => Some(begin_area),
        (None, Some(area)) => Some(area),
        (Some(begin_area), Some(area)) => {
            if area_specificity(area.area_type.as_deref())
                >= area_specificity(begin_area.area_type.as_deref())
            {
                Some(area)
            } else {
                Some(begin_area)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(name: &str, area_type: Option<&str>) -> Area {
        Area {
            id: name.to_lowercase(),
            name: name.to_string(),
            area_type: area_type.map(String::from),
        }
    }

    #[test]
    fn specificity_is_total() {
        for area_type in [
            None,
            Some("Country"),
            Some("Subdivision"),
            Some("County"),
            Some("City"),
            Some("Municipality"),
            Some("District"),
            Some("Town"),
            Some("Village"),
            Some("Island"),
            Some("Military base"),
        ] {
            assert!((-1..=3).contains(&area_specificity(area_type)));
        }
        assert_eq!(area_specificity(None), -1);
        assert_eq!(area_specificity(Some("Country")), 0);
        assert_eq!(area_specificity(Some("Subdivision")), 1);
        assert_eq!(area_specificity(Some("County")), 2);
        assert_eq!(area_specificity(Some("City")), 3);
        assert_eq!(area_specificity(Some("Military base")), 1);
    }

    #[test]
    fn city_level_iff_specificity_three() {
        assert!(is_city_level(Some("City")));
        assert!(is_city_level(Some("village")));
        assert!(!is_city_level(Some("Subdivision")));
        assert!(!is_city_level(Some("Country")));
        assert!(!is_city_level(None));
    }

    #[test]
    fn city_begin_area_beats_country_area() {
        let best = choose_best_area(
            Some(area("West Reading", Some("City"))),
            Some(area("United States", Some("Country"))),
        )
        .unwrap();
        assert_eq!(best.name, "West Reading");
    }

    #[test]
    fn ties_resolve_to_area() {
        let best = choose_best_area(
            Some(area("Australia", Some("Country"))),
            Some(area("Australia (dup)", Some("Country"))),
        )
        .unwrap();
        assert_eq!(best.name, "Australia (dup)");
    }

    #[test]
    fn lone_field_wins_by_default() {
        assert_eq!(
            choose_best_area(Some(area("Perth", Some("City"))), None)
                .unwrap()
                .name,
            "Perth"
        );
        assert_eq!(
            choose_best_area(None, Some(area("Australia", Some("Country"))))
                .unwrap()
                .name,
            "Australia"
        );
        assert!(choose_best_area(None, None).is_none());
    }
}
