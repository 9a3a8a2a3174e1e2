//! Administrative hierarchy types (voivodeship → county → municipality).
//!
//! Entities live in flat arenas owned by [`AdminHierarchy`]; parents refer to
//! children (and back) by typed index, and code lookups go through index maps.

use hashbrown::HashMap;
use serde::Serialize;

/// Level of a row in the administrative table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdminLevel {
    /// Top level unit (województwo)
    Voivodeship,
    /// Second level (powiat)
    County,
    /// Third level (gmina)
    Municipality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoivodeshipId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CountyId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MunicipalityId(usize);

/// Display name and code of a listed entity
pub trait Named {
    fn name(&self) -> &str;
    fn code(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Voivodeship {
    pub name: String,
    pub code: String,
    #[serde(skip)]
    counties: Vec<CountyId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct County {
    pub name: String,
    pub code: String,
    #[serde(skip)]
    voivodeship: VoivodeshipId,
    #[serde(skip)]
    municipalities: Vec<MunicipalityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Municipality {
    /// Display name, `"<name> (<area name>)"`
    pub name: String,
    pub code: String,
    /// One character classifier (urban, rural, mixed, ...)
    pub kind: String,
    #[serde(skip)]
    county: CountyId,
}

impl Named for Voivodeship {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> &str {
        &self.code
    }
}

impl Named for County {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> &str {
        &self.code
    }
}

impl Named for Municipality {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> &str {
        &self.code
    }
}

/// Read-only administrative tree built once from the TERYT table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminHierarchy {
    voivodeships: Vec<Voivodeship>,
    counties: Vec<County>,
    municipalities: Vec<Municipality>,
    voivodeship_index: HashMap<String, VoivodeshipId>,
    county_index: HashMap<(String, String), CountyId>,
}

impl AdminHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a voivodeship unless one with the same code exists (first wins)
    pub(crate) fn insert_voivodeship(&mut self, code: &str, name: &str) -> VoivodeshipId {
        if let Some(id) = self.voivodeship_index.get(code) {
            return *id;
        }

        let id = VoivodeshipId(self.voivodeships.len());
        self.voivodeships.push(Voivodeship {
            name: name.to_string(),
            code: code.to_string(),
            counties: Vec::new(),
        });
        self.voivodeship_index.insert(code.to_string(), id);
        id
    }

    /// Insert a county under an existing voivodeship, once per code pair.
    ///
    /// Returns `None` when the parent voivodeship is unknown.
    pub(crate) fn insert_county(
        &mut self,
        voivodeship_code: &str,
        code: &str,
        name: &str,
    ) -> Option<CountyId> {
        let key = (voivodeship_code.to_string(), code.to_string());
        if let Some(id) = self.county_index.get(&key) {
            return Some(*id);
        }

        let parent = *self.voivodeship_index.get(voivodeship_code)?;
        let id = CountyId(self.counties.len());
        self.counties.push(County {
            name: name.to_string(),
            code: code.to_string(),
            voivodeship: parent,
            municipalities: Vec::new(),
        });
        self.voivodeships[parent.0].counties.push(id);
        self.county_index.insert(key, id);
        Some(id)
    }

    /// Append a municipality to an existing county. Repeated rows are kept.
    ///
    /// Returns `None` when the parent county is unknown.
    pub(crate) fn push_municipality(
        &mut self,
        voivodeship_code: &str,
        county_code: &str,
        code: &str,
        kind: &str,
        name: String,
    ) -> Option<MunicipalityId> {
        let parent = *self
            .county_index
            .get(&(voivodeship_code.to_string(), county_code.to_string()))?;

        let id = MunicipalityId(self.municipalities.len());
        self.municipalities.push(Municipality {
            name,
            code: code.to_string(),
            kind: kind.to_string(),
            county: parent,
        });
        self.counties[parent.0].municipalities.push(id);
        Some(id)
    }

    /// Voivodeships in order of first appearance in the table
    pub fn voivodeships(&self) -> impl Iterator<Item = &Voivodeship> {
        self.voivodeships.iter()
    }

    pub fn voivodeship(&self, code: &str) -> Option<&Voivodeship> {
        self.voivodeship_index
            .get(code)
            .map(|id| &self.voivodeships[id.0])
    }

    /// Counties of a voivodeship, in creation order
    pub fn counties<'a>(&'a self, voivodeship: &'a Voivodeship) -> impl Iterator<Item = &'a County> {
        voivodeship.counties.iter().map(|id| &self.counties[id.0])
    }

    pub fn county(&self, voivodeship_code: &str, county_code: &str) -> Option<&County> {
        self.county_index
            .get(&(voivodeship_code.to_string(), county_code.to_string()))
            .map(|id| &self.counties[id.0])
    }

    /// Municipalities of a county, in file order
    pub fn municipalities<'a>(&'a self, county: &'a County) -> impl Iterator<Item = &'a Municipality> {
        county.municipalities.iter().map(|id| &self.municipalities[id.0])
    }

    /// First municipality matching the full code tuple
    pub fn municipality(
        &self,
        voivodeship_code: &str,
        county_code: &str,
        code: &str,
        kind: &str,
    ) -> Option<&Municipality> {
        let county = self.county(voivodeship_code, county_code)?;
        self.municipalities(county)
            .find(|m| m.code == code && m.kind == kind)
    }

    pub fn voivodeship_of(&self, county: &County) -> &Voivodeship {
        &self.voivodeships[county.voivodeship.0]
    }

    pub fn county_of(&self, municipality: &Municipality) -> &County {
        &self.counties[municipality.county.0]
    }

    /// Registry identifier of a municipality: `{woj}{pow}{gmi}_{kind}`
    pub fn municipality_identifier(&self, municipality: &Municipality) -> String {
        let county = self.county_of(municipality);
        let voivodeship = self.voivodeship_of(county);
        format!(
            "{}{}{}_{}",
            voivodeship.code, county.code, municipality.code, municipality.kind
        )
    }

    /// Entity counts per level
    pub fn len(&self, level: AdminLevel) -> usize {
        match level {
            AdminLevel::Voivodeship => self.voivodeships.len(),
            AdminLevel::County => self.counties.len(),
            AdminLevel::Municipality => self.municipalities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.voivodeships.is_empty()
    }
}

/// Polish diacritics sort as their own letter right after the base letter
fn polish_letter(c: char) -> (char, u8) {
    match c {
        'ą' => ('a', 1),
        'ć' => ('c', 1),
        'ę' => ('e', 1),
        'ł' => ('l', 1),
        'ń' => ('n', 1),
        'ó' => ('o', 1),
        'ś' => ('s', 1),
        'ź' => ('z', 1),
        'ż' => ('z', 2),
        c => (c, 0),
    }
}

/// Case-insensitive sort key following the Polish alphabet
pub fn collation_key(name: &str) -> Vec<(char, u8)> {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(polish_letter)
        .collect()
}

/// Sort entities case-insensitively by display name, in Polish alphabet order
pub fn sorted_by_name<'a, T, I>(items: I) -> Vec<&'a T>
where
    T: Named + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut items: Vec<&T> = items.into_iter().collect();
    items.sort_by_cached_key(|item| collation_key(item.name()));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AdminHierarchy {
        let mut h = AdminHierarchy::new();
        h.insert_voivodeship("14", "MAZOWIECKIE");
        h.insert_county("14", "65", "Warszawa");
        h.push_municipality("14", "65", "01", "1", "Warszawa (miasto)".to_string());
        h
    }

    #[test]
    fn test_voivodeship_first_wins() {
        let mut h = sample();
        let first = h.voivodeship("14").map(|v| v.name.clone());
        h.insert_voivodeship("14", "OTHER");
        assert_eq!(h.voivodeship("14").map(|v| v.name.clone()), first);
        assert_eq!(h.len(AdminLevel::Voivodeship), 1);
    }

    #[test]
    fn test_county_requires_parent() {
        let mut h = sample();
        assert!(h.insert_county("02", "01", "bolesławiecki").is_none());
        assert_eq!(h.len(AdminLevel::County), 1);
    }

    #[test]
    fn test_county_inserted_once() {
        let mut h = sample();
        let a = h.insert_county("14", "65", "Warszawa");
        let b = h.insert_county("14", "65", "Warszawa again");
        assert_eq!(a, b);
        let v = h.voivodeship("14").unwrap();
        assert_eq!(h.counties(v).count(), 1);
    }

    #[test]
    fn test_municipality_identifier() {
        let h = sample();
        let m = h.municipality("14", "65", "01", "1").unwrap();
        assert_eq!(h.municipality_identifier(m), "146501_1");
        assert_eq!(h.county_of(m).code, "65");
    }

    #[test]
    fn test_sorted_by_name_is_case_insensitive() {
        let mut h = AdminHierarchy::new();
        h.insert_voivodeship("02", "dolnośląskie");
        h.insert_voivodeship("04", "KUJAWSKO-POMORSKIE");
        h.insert_voivodeship("06", "Lubelskie");
        let names: Vec<&str> = sorted_by_name(h.voivodeships())
            .into_iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["dolnośląskie", "KUJAWSKO-POMORSKIE", "Lubelskie"]);
    }

    #[test]
    fn test_sorted_by_name_follows_polish_alphabet() {
        let mut h = AdminHierarchy::new();
        for (code, name) in [
            ("32", "zachodniopomorskie"),
            ("24", "śląskie"),
            ("12", "małopolskie"),
            ("10", "łódzkie"),
            ("08", "lubuskie"),
            ("06", "lubelskie"),
            ("26", "Świętokrzyskie"),
        ] {
            h.insert_voivodeship(code, name);
        }
        let names: Vec<&str> = sorted_by_name(h.voivodeships())
            .into_iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "lubelskie",
                "lubuskie",
                "łódzkie",
                "małopolskie",
                "śląskie",
                "Świętokrzyskie",
                "zachodniopomorskie",
            ]
        );
    }

    #[test]
    fn test_collation_key_orders_diacritics_after_base_letter() {
        assert!(collation_key("Łask") > collation_key("lz"));
        assert!(collation_key("Łask") < collation_key("ma"));
        assert!(collation_key("żary") > collation_key("źle"));
        assert!(collation_key("źle") > collation_key("zz"));
    }
}
