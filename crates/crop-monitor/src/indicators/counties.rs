//! Iowa county FIPS codes (state 19), indexed by county code.

const IOWA_STATE_PREFIX: &str = "19";

const IOWA_COUNTIES: [&str; 99] = [
    "Adair",
    "Adams",
    "Allamakee",
    "Appanoose",
    "Audubon",
    "Benton",
    "Black Hawk",
    "Boone",
    "Bremer",
    "Buchanan",
    "Buena Vista",
    "Butler",
    "Calhoun",
    "Carroll",
    "Cass",
    "Cedar",
    "Cerro Gordo",
    "Cherokee",
    "Chickasaw",
    "Clarke",
    "Clay",
    "Clayton",
    "Clinton",
    "Crawford",
    "Dallas",
    "Davis",
    "Decatur",
    "Delaware",
    "Des Moines",
    "Dickinson",
    "Dubuque",
    "Emmet",
    "Fayette",
    "Floyd",
    "Franklin",
    "Fremont",
    "Greene",
    "Grundy",
    "Guthrie",
    "Hamilton",
    "Hancock",
    "Hardin",
    "Harrison",
    "Henry",
    "Howard",
    "Humboldt",
    "Ida",
    "Iowa",
    "Jackson",
    "Jasper",
    "Jefferson",
    "Johnson",
    "Jones",
    "Keokuk",
    "Kossuth",
    "Lee",
    "Linn",
    "Louisa",
    "Lucas",
    "Lyon",
    "Madison",
    "Mahaska",
    "Marion",
    "Marshall",
    "Mills",
    "Mitchell",
    "Monona",
    "Monroe",
    "Montgomery",
    "Muscatine",
    "O'Brien",
    "Osceola",
    "Page",
    "Palo Alto",
    "Plymouth",
    "Pocahontas",
    "Polk",
    "Pottawattamie",
    "Poweshiek",
    "Ringgold",
    "Sac",
    "Scott",
    "Shelby",
    "Sioux",
    "Story",
    "Tama",
    "Taylor",
    "Union",
    "Van Buren",
    "Wapello",
    "Warren",
    "Washington",
    "Wayne",
    "Webster",
    "Winnebago",
    "Winneshiek",
    "Woodbury",
    "Worth",
    "Wright",
];

fn county_index(fips: &str) -> Option<usize> {
    let county = fips.strip_prefix(IOWA_STATE_PREFIX)?;
    if county.len() != 3 {
        return None;
    }
    let code: usize = county.parse().ok()?;
    if code % 2 == 0 || code == 0 {
        return None;
    }
    let index = (code - 1) / 2;
    (index < IOWA_COUNTIES.len()).then_some(index)
}

pub fn is_iowa_county(fips: &str) -> bool {
    county_index(fips).is_some()
}

pub fn county_name(fips: &str) -> Option<&'static str> {
    county_index(fips).map(|index| IOWA_COUNTIES[index])
}

/// Every Iowa county code in ascending order.
pub fn iowa_fips_codes() -> impl Iterator<Item = String> {
    (0..IOWA_COUNTIES.len()).map(|index| format!("{IOWA_STATE_PREFIX}{:03}", index * 2 + 1))
}
