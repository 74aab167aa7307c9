// src/models/category.rs
// DOCUMENTATION: Merchant Category Code (MCC) table
// PURPOSE: Resolve MCC codes to category names and classify upstream place types

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Name returned for codes the table does not know
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Broad merchant group a place type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MccGroup {
    Retail,
    Food,
    Services,
    Entertainment,
    Travel,
    Financial,
    Religious,
    Arts,
}

impl MccGroup {
    pub const ALL: [MccGroup; 8] = [
        MccGroup::Retail,
        MccGroup::Food,
        MccGroup::Services,
        MccGroup::Entertainment,
        MccGroup::Travel,
        MccGroup::Financial,
        MccGroup::Religious,
        MccGroup::Arts,
    ];

    /// Short command-line name
    pub fn key(&self) -> &'static str {
        match self {
            MccGroup::Retail => "retail",
            MccGroup::Food => "food",
            MccGroup::Services => "services",
            MccGroup::Entertainment => "entertainment",
            MccGroup::Travel => "travel",
            MccGroup::Financial => "financial",
            MccGroup::Religious => "religious",
            MccGroup::Arts => "arts",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MccGroup::Retail => "Retail",
            MccGroup::Food => "Food & Beverage",
            MccGroup::Services => "Services",
            MccGroup::Entertainment => "Entertainment",
            MccGroup::Travel => "Travel",
            MccGroup::Financial => "Financial",
            MccGroup::Religious => "Religious",
            MccGroup::Arts => "Arts & Crafts",
        }
    }
}

impl fmt::Display for MccGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MccGroup {
    type Err = String;

    /// Accepts the short key ("food") or the display name ("Food & Beverage"), any case
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        MccGroup::ALL
            .into_iter()
            .find(|group| {
                group.key().eq_ignore_ascii_case(value) || group.as_str().eq_ignore_ascii_case(value)
            })
            .ok_or_else(|| {
                let keys: Vec<&str> = MccGroup::ALL.iter().map(MccGroup::key).collect();
                format!("unknown group '{}', expected one of: {}", value, keys.join(", "))
            })
    }
}

/// MCC code descriptions (ISO 18245 wording, shortened)
const MCC_NAMES: &[(u16, &str)] = &[
    (742, "Veterinary Services"),
    (1711, "Heating, Plumbing, and Air-Conditioning Contractors"),
    (1731, "Electrical Contractors"),
    (4111, "Local and Suburban Commuter Passenger Transportation"),
    (4112, "Passenger Railways"),
    (4113, "Passenger Ferry Services"),
    (4214, "Motor Freight Carriers, Moving and Storage Companies"),
    (4215, "Courier Services and Freight Forwarders"),
    (4582, "Airports, Flying Fields, and Airport Terminals"),
    (4722, "Travel Agencies and Tour Operators"),
    (4812, "Telecommunication Equipment and Telephone Sales"),
    (5047, "Medical, Dental, and Hospital Equipment and Supplies"),
    (5251, "Hardware Stores"),
    (5300, "Wholesale Clubs"),
    (5311, "Department Stores"),
    (5399, "Miscellaneous General Merchandise"),
    (5411, "Grocery Stores and Supermarkets"),
    (5451, "Dairy Products Stores"),
    (5462, "Bakeries"),
    (5499, "Miscellaneous Food Stores"),
    (5511, "Car and Truck Dealers"),
    (5541, "Service Stations"),
    (5571, "Motorcycle Shops and Dealers"),
    (5651, "Family Clothing Stores"),
    (5661, "Shoe Stores"),
    (5697, "Tailors, Seamstresses, Mending, and Alterations"),
    (5712, "Furniture and Home Furnishings Stores"),
    (5719, "Miscellaneous Home Furnishing Specialty Stores"),
    (5732, "Electronics Stores"),
    (5733, "Music Stores, Musical Instruments, and Sheet Music"),
    (5734, "Computer Software Stores"),
    (5812, "Eating Places and Restaurants"),
    (5813, "Drinking Places, Bars, Taverns, and Nightclubs"),
    (5814, "Fast Food Restaurants"),
    (5912, "Drug Stores and Pharmacies"),
    (5921, "Package Stores, Beer, Wine, and Liquor"),
    (5933, "Pawn Shops"),
    (5940, "Bicycle Shops"),
    (5941, "Sporting Goods Stores"),
    (5942, "Book Stores"),
    (5943, "Stationery, Office, and School Supply Stores"),
    (5944, "Jewelry, Watch, Clock, and Silverware Stores"),
    (5945, "Hobby, Toy, and Game Shops"),
    (5946, "Camera and Photographic Supply Stores"),
    (5947, "Gift, Card, Novelty, and Souvenir Shops"),
    (5949, "Sewing, Needlework, Fabric, and Piece Goods Stores"),
    (5971, "Art Dealers and Galleries"),
    (5973, "Religious Goods Stores"),
    (5975, "Hearing Aids Sales and Supplies"),
    (5977, "Cosmetic Stores"),
    (5992, "Florists"),
    (5995, "Pet Shops, Pet Food, and Supplies"),
    (6011, "Automated Cash Disbursements"),
    (6012, "Financial Institutions, Merchandise and Services"),
    (6051, "Foreign Currency, Money Orders, and Travelers' Cheques"),
    (6211, "Security Brokers and Dealers"),
    (6300, "Insurance Sales, Underwriting, and Premiums"),
    (7011, "Hotels, Motels, and Resorts"),
    (7211, "Laundries, Family and Commercial"),
    (7216, "Dry Cleaners"),
    (7221, "Photographic Studios"),
    (7230, "Beauty and Barber Shops"),
    (7251, "Shoe Repair Shops and Hat Cleaning"),
    (7297, "Massage Parlors"),
    (7298, "Health and Beauty Spas"),
    (7512, "Car Rental Agencies"),
    (7523, "Parking Lots, Parking Meters, and Garages"),
    (7538, "Automotive Service Shops"),
    (7542, "Car Washes"),
    (7699, "Miscellaneous Repair Shops and Related Services"),
    (7832, "Motion Picture Theaters"),
    (7841, "Video Tape Rental Stores"),
    (7911, "Dance Halls, Studios, and Schools"),
    (7922, "Theatrical Producers and Ticket Agencies"),
    (7933, "Bowling Alleys"),
    (7941, "Commercial Sports, Athletic Fields, and Sports Promoters"),
    (7991, "Tourist Attractions and Exhibits"),
    (7992, "Public Golf Courses"),
    (7993, "Video Amusement Game Supplies"),
    (7996, "Amusement Parks, Circuses, and Carnivals"),
    (7997, "Membership Clubs, Sports and Recreation"),
    (8011, "Doctors"),
    (8021, "Dentists and Orthodontists"),
    (8043, "Opticians and Optical Goods"),
    (8062, "Hospitals"),
    (8211, "Elementary and Secondary Schools"),
    (8299, "Schools and Educational Services"),
    (8661, "Religious Organizations"),
    (8931, "Accounting, Auditing, and Bookkeeping Services"),
];

/// Google place type -> (MCC code, group)
const PLACE_TYPE_CODES: &[(&str, u16, MccGroup)] = &[
    // Retail
    ("store", 5399, MccGroup::Retail),
    ("clothing_store", 5651, MccGroup::Retail),
    ("electronics_store", 5732, MccGroup::Retail),
    ("book_store", 5942, MccGroup::Retail),
    ("jewelry_store", 5944, MccGroup::Retail),
    ("shoe_store", 5661, MccGroup::Retail),
    ("bicycle_store", 5940, MccGroup::Retail),
    ("convenience_store", 5411, MccGroup::Retail),
    ("department_store", 5311, MccGroup::Retail),
    ("furniture_store", 5712, MccGroup::Retail),
    ("hardware_store", 5251, MccGroup::Retail),
    ("home_goods_store", 5719, MccGroup::Retail),
    ("liquor_store", 5921, MccGroup::Retail),
    ("pet_store", 5995, MccGroup::Retail),
    ("shopping_mall", 5300, MccGroup::Retail),
    ("supermarket", 5411, MccGroup::Retail),
    ("florist", 5992, MccGroup::Retail),
    ("gift_shop", 5947, MccGroup::Retail),
    ("toy_store", 5945, MccGroup::Retail),
    ("sporting_goods_store", 5941, MccGroup::Retail),
    ("cosmetics_store", 5977, MccGroup::Retail),
    ("perfumery", 5977, MccGroup::Retail),
    ("stationery_store", 5943, MccGroup::Retail),
    ("computer_store", 5734, MccGroup::Retail),
    ("mobile_phone_shop", 4812, MccGroup::Retail),
    ("camera_store", 5946, MccGroup::Retail),
    ("music_store", 5733, MccGroup::Retail),
    ("video_store", 7841, MccGroup::Retail),
    ("boutique", 5651, MccGroup::Retail),
    // Food & Beverage
    ("restaurant", 5812, MccGroup::Food),
    ("cafe", 5814, MccGroup::Food),
    ("bakery", 5462, MccGroup::Food),
    ("bar", 5813, MccGroup::Food),
    ("meal_delivery", 5812, MccGroup::Food),
    ("meal_takeaway", 5812, MccGroup::Food),
    ("food", 5499, MccGroup::Food),
    ("grocery_or_supermarket", 5411, MccGroup::Food),
    ("ice_cream_shop", 5451, MccGroup::Food),
    ("coffee_shop", 5814, MccGroup::Food),
    ("dessert_shop", 5462, MccGroup::Food),
    ("food_court", 5812, MccGroup::Food),
    ("fast_food_restaurant", 5814, MccGroup::Food),
    ("pizza_restaurant", 5812, MccGroup::Food),
    ("sushi_restaurant", 5812, MccGroup::Food),
    ("steak_house", 5812, MccGroup::Food),
    ("seafood_restaurant", 5812, MccGroup::Food),
    ("vegetarian_restaurant", 5812, MccGroup::Food),
    ("vegan_restaurant", 5812, MccGroup::Food),
    ("buffet_restaurant", 5812, MccGroup::Food),
    // Services
    ("hair_care", 7230, MccGroup::Services),
    ("beauty_salon", 7230, MccGroup::Services),
    ("spa", 7298, MccGroup::Services),
    ("laundry", 7211, MccGroup::Services),
    ("dry_cleaning", 7216, MccGroup::Services),
    ("car_wash", 7542, MccGroup::Services),
    ("car_repair", 7538, MccGroup::Services),
    ("pharmacy", 5912, MccGroup::Services),
    ("dentist", 8021, MccGroup::Services),
    ("doctor", 8011, MccGroup::Services),
    ("hospital", 8062, MccGroup::Services),
    ("veterinary_care", 742, MccGroup::Services),
    ("optician", 8043, MccGroup::Services),
    ("hearing_aid_store", 5975, MccGroup::Services),
    ("medical_supply_store", 5047, MccGroup::Services),
    ("massage_therapist", 7297, MccGroup::Services),
    ("nail_salon", 7230, MccGroup::Services),
    ("tanning_salon", 7297, MccGroup::Services),
    ("tattoo_parlor", 7297, MccGroup::Services),
    ("barber_shop", 7230, MccGroup::Services),
    ("tailor", 5697, MccGroup::Services),
    ("shoe_repair", 7251, MccGroup::Services),
    ("key_shop", 7699, MccGroup::Services),
    ("locksmith", 7699, MccGroup::Services),
    ("moving_company", 4214, MccGroup::Services),
    ("storage", 4215, MccGroup::Services),
    ("plumber", 1711, MccGroup::Services),
    ("electrician", 1731, MccGroup::Services),
    // Entertainment
    ("movie_theater", 7832, MccGroup::Entertainment),
    ("amusement_park", 7996, MccGroup::Entertainment),
    ("aquarium", 7991, MccGroup::Entertainment),
    ("art_gallery", 5971, MccGroup::Entertainment),
    ("bowling_alley", 7933, MccGroup::Entertainment),
    ("casino", 7993, MccGroup::Entertainment),
    ("museum", 7991, MccGroup::Entertainment),
    ("night_club", 5813, MccGroup::Entertainment),
    ("park", 7991, MccGroup::Entertainment),
    ("stadium", 7941, MccGroup::Entertainment),
    ("zoo", 7991, MccGroup::Entertainment),
    ("theater", 7922, MccGroup::Entertainment),
    ("concert_hall", 7922, MccGroup::Entertainment),
    ("comedy_club", 7922, MccGroup::Entertainment),
    ("dance_studio", 7911, MccGroup::Entertainment),
    ("gym", 7997, MccGroup::Entertainment),
    ("fitness_center", 7997, MccGroup::Entertainment),
    ("yoga_studio", 7997, MccGroup::Entertainment),
    ("sports_club", 7997, MccGroup::Entertainment),
    ("golf_course", 7992, MccGroup::Entertainment),
    ("tennis_court", 7992, MccGroup::Entertainment),
    ("swimming_pool", 7997, MccGroup::Entertainment),
    ("arcade", 7993, MccGroup::Entertainment),
    ("billiards_hall", 7933, MccGroup::Entertainment),
    ("pool_hall", 7933, MccGroup::Entertainment),
    ("karaoke_bar", 5813, MccGroup::Entertainment),
    // Travel
    ("lodging", 7011, MccGroup::Travel),
    ("travel_agency", 4722, MccGroup::Travel),
    ("tourist_attraction", 7991, MccGroup::Travel),
    ("hostel", 7011, MccGroup::Travel),
    ("bed_and_breakfast", 7011, MccGroup::Travel),
    ("resort", 7011, MccGroup::Travel),
    ("motel", 7011, MccGroup::Travel),
    ("car_rental", 7512, MccGroup::Travel),
    ("bicycle_rental", 7512, MccGroup::Travel),
    ("boat_rental", 7512, MccGroup::Travel),
    ("tour_operator", 4722, MccGroup::Travel),
    ("tourist_information_center", 4722, MccGroup::Travel),
    ("airport", 4582, MccGroup::Travel),
    ("train_station", 4111, MccGroup::Travel),
    ("bus_station", 4112, MccGroup::Travel),
    ("ferry_terminal", 4113, MccGroup::Travel),
    ("parking", 7523, MccGroup::Travel),
    ("gas_station", 5541, MccGroup::Travel),
    ("car_dealer", 5511, MccGroup::Travel),
    ("motorcycle_dealer", 5571, MccGroup::Travel),
    // Financial
    ("bank", 6012, MccGroup::Financial),
    ("atm", 6011, MccGroup::Financial),
    ("insurance_agency", 6300, MccGroup::Financial),
    ("accounting", 8931, MccGroup::Financial),
    ("tax_preparation", 8931, MccGroup::Financial),
    ("financial_advisor", 6211, MccGroup::Financial),
    ("mortgage_broker", 6211, MccGroup::Financial),
    ("credit_union", 6012, MccGroup::Financial),
    ("currency_exchange", 6051, MccGroup::Financial),
    ("pawn_shop", 5933, MccGroup::Financial),
    ("check_cashing_service", 6051, MccGroup::Financial),
    ("payday_loan_service", 6012, MccGroup::Financial),
    // Religious
    ("church", 8661, MccGroup::Religious),
    ("mosque", 8661, MccGroup::Religious),
    ("synagogue", 8661, MccGroup::Religious),
    ("temple", 8661, MccGroup::Religious),
    ("religious_organization", 8661, MccGroup::Religious),
    ("religious_school", 8211, MccGroup::Religious),
    ("religious_bookstore", 5942, MccGroup::Religious),
    ("religious_goods_store", 5973, MccGroup::Religious),
    // Arts & Crafts
    ("art_school", 8299, MccGroup::Arts),
    ("art_supply_store", 5971, MccGroup::Arts),
    ("craft_store", 5971, MccGroup::Arts),
    ("fabric_store", 5949, MccGroup::Arts),
    ("pottery_store", 5971, MccGroup::Arts),
    ("photography_studio", 7221, MccGroup::Arts),
    ("musical_instrument_store", 5733, MccGroup::Arts),
];

/// Place type mapping entry
#[derive(Debug, Clone, Copy)]
struct TypeEntry {
    code: u16,
    group: MccGroup,
}

/// Read-only MCC lookup table
/// DOCUMENTATION: Built once at startup and passed by reference into the pipeline
/// Tests may build alternate tables with `from_entries`
#[derive(Debug, Clone)]
pub struct CategoryTable {
    names: HashMap<u16, String>,
    place_types: HashMap<String, TypeEntry>,
}

impl CategoryTable {
    /// Table covering the MCC codes of every mapped Google place type
    pub fn standard() -> Self {
        Self::from_entries(
            MCC_NAMES.iter().map(|(code, name)| (*code, *name)),
            PLACE_TYPE_CODES
                .iter()
                .map(|(place_type, code, group)| (*place_type, *code, *group)),
        )
    }

    /// Build a table from explicit code names and place type mappings
    pub fn from_entries<'a>(
        names: impl IntoIterator<Item = (u16, &'a str)>,
        place_types: impl IntoIterator<Item = (&'a str, u16, MccGroup)>,
    ) -> Self {
        Self {
            names: names
                .into_iter()
                .map(|(code, name)| (code, name.to_string()))
                .collect(),
            place_types: place_types
                .into_iter()
                .map(|(place_type, code, group)| (place_type.to_string(), TypeEntry { code, group }))
                .collect(),
        }
    }

    /// Resolve a category name for any integer code
    /// DOCUMENTATION: Total function; unknown, negative and out-of-range codes
    /// all resolve to `UNCATEGORIZED`
    pub fn lookup(&self, code: i64) -> &str {
        u16::try_from(code)
            .ok()
            .and_then(|code| self.names.get(&code))
            .map(String::as_str)
            .unwrap_or(UNCATEGORIZED)
    }

    /// Same as `lookup`, treating a missing code as unknown
    pub fn lookup_optional(&self, code: Option<u16>) -> &str {
        code.map_or(UNCATEGORIZED, |code| self.lookup(i64::from(code)))
    }

    /// Classify a result by its place types
    /// DOCUMENTATION: The first type (in upstream order) with a mapping wins;
    /// generic types such as "point_of_interest" never map
    pub fn classify<S: AsRef<str>>(&self, types: &[S]) -> Option<u16> {
        types
            .iter()
            .find_map(|place_type| self.place_types.get(place_type.as_ref()))
            .map(|entry| entry.code)
    }

    /// All place types mapped under a group, sorted
    pub fn types_in_group(&self, group: MccGroup) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .place_types
            .iter()
            .filter(|(_, entry)| entry.group == group)
            .map(|(place_type, _)| place_type.as_str())
            .collect();
        types.sort_unstable();
        types
    }
}

/// Render a code the way MCC codes are written: four digits, zero padded
pub fn format_code(code: u16) -> String {
    format!("{:04}", code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_are_stable() {
        let table = CategoryTable::standard();

        for (code, name) in MCC_NAMES {
            let first = table.lookup(i64::from(*code)).to_string();
            let second = table.lookup(i64::from(*code)).to_string();
            assert_eq!(first, *name);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_unknown_codes_are_uncategorized() {
        let table = CategoryTable::standard();

        for code in [0, 1, 9999, -1, -5812, 65_536, 5812 + 65_536, i64::MAX, i64::MIN] {
            assert_eq!(table.lookup(code), UNCATEGORIZED, "code {}", code);
        }
        assert_eq!(table.lookup_optional(None), UNCATEGORIZED);
    }

    #[test]
    fn test_every_mapped_type_has_a_named_code() {
        let table = CategoryTable::standard();

        for (place_type, code, _) in PLACE_TYPE_CODES {
            assert_ne!(
                table.lookup(i64::from(*code)),
                UNCATEGORIZED,
                "{} maps to unnamed code {}",
                place_type,
                code
            );
            assert!(*code <= 9999);
        }
    }

    #[test]
    fn test_classify_uses_first_mapped_type() {
        let table = CategoryTable::standard();

        let types = ["point_of_interest", "restaurant", "bar"];
        assert_eq!(table.classify(&types), Some(5812));

        let types = vec!["bar".to_string(), "restaurant".to_string()];
        assert_eq!(table.classify(&types), Some(5813));

        let types = ["point_of_interest", "establishment"];
        assert_eq!(table.classify(&types), None);

        let empty: [&str; 0] = [];
        assert_eq!(table.classify(&empty), None);
    }

    #[test]
    fn test_veterinary_code_is_zero_padded() {
        let table = CategoryTable::standard();

        let code = table.classify(&["veterinary_care"]).unwrap();
        assert_eq!(code, 742);
        assert_eq!(format_code(code), "0742");
        assert_eq!(table.lookup(742), "Veterinary Services");
    }

    #[test]
    fn test_groups() {
        let table = CategoryTable::standard();

        let food = table.types_in_group(MccGroup::Food);
        assert!(food.contains(&"restaurant"));
        assert!(food.contains(&"grocery_or_supermarket"));

        let retail = table.types_in_group(MccGroup::Retail);
        assert!(retail.contains(&"store"));
        assert!(!retail.contains(&"restaurant"));
        assert!(retail.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(MccGroup::Arts.to_string(), "Arts & Crafts");
    }

    #[test]
    fn test_every_group_has_types() {
        let table = CategoryTable::standard();
        for group in MccGroup::ALL {
            assert!(!table.types_in_group(group).is_empty(), "{} is empty", group);
        }
    }

    #[test]
    fn test_group_from_str() {
        assert_eq!("food".parse::<MccGroup>(), Ok(MccGroup::Food));
        assert_eq!("Food & Beverage".parse::<MccGroup>(), Ok(MccGroup::Food));
        assert_eq!(" ARTS ".parse::<MccGroup>(), Ok(MccGroup::Arts));

        let err = "groceries".parse::<MccGroup>().unwrap_err();
        assert!(err.contains("retail"));
    }

    #[test]
    fn test_injected_table() {
        let table = CategoryTable::from_entries(
            [(1234, "Test Category")],
            [("test_type", 1234, MccGroup::Services)],
        );

        assert_eq!(table.classify(&["restaurant", "test_type"]), Some(1234));
        assert_eq!(table.lookup(1234), "Test Category");
        assert_eq!(table.lookup(5812), UNCATEGORIZED);
    }
}
