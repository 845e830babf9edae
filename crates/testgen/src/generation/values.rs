//! Value production for generated XML content.
//!
//! Two producers: [`ValueRegistry`] turns a semantic type token into a
//! literal ("email", "decimal(100,1000,2)", "pattern:{######}"), and
//! [`XsdValueGenerator`] falls back to the XSD base type and facets when
//! no token is bound.

use crate::xsd::model::XsdSimpleType;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;

static PARAMETERIZED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\((.*)\)$").expect("static regex"));
static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(#+)\}").expect("static regex"));
static LETTER_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(A+)\}").expect("static regex"));
static SEQ_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{seq:(\d+)\}").expect("static regex"));
static UPPER_RUN_PATTERN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[A-Z\]\{(\d+)\}$").expect("static regex"));
static DIGIT_RUN_PATTERN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[0-9\]\{(\d+)\}$").expect("static regex"));

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas",
    "Sarah", "Carlos", "Maria", "Wei", "Priya", "Ahmed", "Fatima",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore",
    "Jackson", "Nguyen", "Patel", "Kim", "Chen",
];
const NAME_PREFIXES: &[&str] = &["Mr.", "Mrs.", "Ms.", "Dr."];
const NAME_SUFFIXES: &[&str] = &["Jr.", "Sr.", "II", "III", "IV", "MD", "PhD"];
const STREET_NAMES: &[&str] = &[
    "Main", "Oak", "Maple", "Cedar", "Elm", "Washington", "Lake", "Hill", "Park", "Pine",
    "Walnut", "River", "Sunset", "Highland", "Franklin",
];
const STREET_SUFFIXES: &[&str] = &["St", "Ave", "Blvd", "Dr", "Ln", "Rd", "Ct", "Way"];
const CITIES: &[&str] = &[
    "Springfield", "Riverton", "Fairview", "Georgetown", "Clinton", "Salem", "Madison",
    "Arlington", "Ashland", "Burlington", "Clayton", "Dayton", "Franklin", "Greenville",
    "Milton", "Oakdale",
];
const STATES: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Illinois", "IL"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("New Jersey", "NJ"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("Ohio", "OH"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Texas", "TX"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("Wisconsin", "WI"),
];
const COUNTRIES: &[&str] = &[
    "United States", "Canada", "Mexico", "United Kingdom", "Germany", "France", "Japan",
    "Australia", "Brazil", "India",
];
const COMPANY_SUFFIXES: &[&str] = &["Inc", "LLC", "Group", "Ltd", "Holdings", "and Sons", "PLC"];
const JOB_TITLES: &[&str] = &[
    "Account Manager", "Software Engineer", "Operations Analyst", "Branch Manager",
    "Loan Officer", "Compliance Specialist", "Product Manager", "Data Analyst",
    "Customer Advocate", "Underwriter",
];
const CURRENCY_CODES: &[&str] = &["USD", "EUR", "GBP", "CAD", "AUD", "JPY", "CHF"];
const DOMAIN_TLDS: &[&str] = &["com", "org", "net", "io"];
const WORDS: &[&str] = &[
    "account", "balance", "branch", "catalog", "ceremony", "channel", "customer", "deposit",
    "document", "field", "ledger", "lineage", "payment", "profile", "record", "schema",
    "service", "statement", "transfer", "vault",
];
const VEHICLE_MAKES: &[&str] = &[
    "Toyota", "Honda", "Ford", "Chevrolet", "BMW", "Mercedes", "Audi", "Tesla",
];
const VEHICLE_MODELS: &[&str] = &[
    "Sedan", "SUV", "Truck", "Coupe", "Hatchback", "Convertible", "Minivan",
];
const VIN_CHARS: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ0123456789";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

/// Every registered named kind. Parameterized (`kind(...)`) and
/// `pattern:` tokens are recognized structurally instead.
pub const NAMED_KINDS: &[&str] = &[
    "person.first_name", "person.last_name", "person.full_name", "person.prefix",
    "person.suffix", "ssn", "ssn.masked", "email", "phone_number", "phone.mobile",
    "phone.landline", "address.street", "address.street1", "address.street2", "address.city",
    "address.state", "address.state_abbr", "address.zipcode", "address.zip", "address.country",
    "address.full", "account.number", "routing.number", "credit_card.number", "currency.code",
    "currency.amount", "date.past", "date.future", "date.birth", "date.today", "datetime.past",
    "datetime.future", "company.name", "company.suffix", "job.title", "url", "domain",
    "username", "ipv4", "text.word", "text.sentence", "text.paragraph", "uuid", "code.alpha",
    "code.numeric", "code.alphanumeric", "vehicle.vin", "vehicle.make", "vehicle.model",
    "vehicle.year", "boolean", "yes_no", "y_n",
];

/// Registry of semantic type generators.
///
/// Token shapes: a named kind from [`NAMED_KINDS`], a parameterized kind
/// like `integer(1, 99)`, or a `pattern:` template. Unknown tokens fall
/// back to a random short string.
pub struct ValueRegistry {
    rng: StdRng,
}

impl ValueRegistry {
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: seeded(seed) }
    }

    /// Generates a value for a semantic type token.
    pub fn generate(&mut self, semantic_type: &str) -> String {
        if semantic_type.contains('(') {
            return self.generate_parameterized(semantic_type);
        }
        if let Some(template) = semantic_type.strip_prefix("pattern:") {
            return self.generate_from_template(template);
        }
        self.generate_named(semantic_type)
            .unwrap_or_else(|| self.random_chars(LOWERCASE, 20))
    }

    /// Whether a token is recognized (named, parameterized, or pattern).
    pub fn has_semantic_type(&self, semantic_type: &str) -> bool {
        semantic_type.contains('(')
            || semantic_type.starts_with("pattern:")
            || NAMED_KINDS.contains(&semantic_type)
    }

    pub(crate) fn generate_named(&mut self, kind: &str) -> Option<String> {
        let value = match kind {
            "person.first_name" => self.choose(FIRST_NAMES).to_string(),
            "person.last_name" => self.choose(LAST_NAMES).to_string(),
            "person.full_name" => {
                format!("{} {}", self.choose(FIRST_NAMES), self.choose(LAST_NAMES))
            }
            "person.prefix" => self.choose(NAME_PREFIXES).to_string(),
            "person.suffix" => self.choose(NAME_SUFFIXES).to_string(),
            "ssn" => format!(
                "{:03}-{:02}-{:04}",
                self.rng.gen_range(100..900),
                self.rng.gen_range(10..100),
                self.rng.gen_range(1000..10000)
            ),
            "ssn.masked" => format!("XXX-XX-{:04}", self.rng.gen_range(1000..10000)),
            "email" => {
                let first = self.choose(FIRST_NAMES).to_lowercase();
                let last = self.choose(LAST_NAMES).to_lowercase();
                let n = self.rng.gen_range(1..100);
                format!("{first}.{last}{n}@example.{}", self.choose(DOMAIN_TLDS))
            }
            "phone_number" | "phone.mobile" | "phone.landline" => format!(
                "({}) {}-{:04}",
                self.rng.gen_range(200..990),
                self.rng.gen_range(200..990),
                self.rng.gen_range(0..10000)
            ),
            "address.street" | "address.street1" => format!(
                "{} {} {}",
                self.rng.gen_range(100..10000),
                self.choose(STREET_NAMES),
                self.choose(STREET_SUFFIXES)
            ),
            "address.street2" => format!("Apt. {}", self.rng.gen_range(1..500)),
            "address.city" => self.choose(CITIES).to_string(),
            "address.state" => self.choose(STATES).0.to_string(),
            "address.state_abbr" => self.choose(STATES).1.to_string(),
            "address.zipcode" | "address.zip" => format!("{:05}", self.rng.gen_range(501..99951)),
            "address.country" => self.choose(COUNTRIES).to_string(),
            "address.full" => {
                let street = self.generate_named("address.street")?;
                let city = self.choose(CITIES);
                let state = self.choose(STATES).1;
                let zip = self.generate_named("address.zipcode")?;
                format!("{street}, {city}, {state} {zip}")
            }
            "account.number" => self.random_chars(DIGITS, 12),
            "routing.number" => self.random_chars(DIGITS, 9),
            "credit_card.number" => self.random_chars(DIGITS, 16),
            "currency.code" => self.choose(CURRENCY_CODES).to_string(),
            "currency.amount" => format!("{:.2}", self.rng.gen_range(0.0..10000.0)),
            "date.past" => self.offset_date(-3650, 0),
            "date.future" => self.offset_date(1, 365),
            "date.birth" => self.offset_date(-80 * 365, -18 * 365),
            "date.today" => Utc::now().date_naive().to_string(),
            "datetime.past" => self.offset_datetime(-3650, 0),
            "datetime.future" => self.offset_datetime(1, 365),
            "company.name" => format!(
                "{} {}",
                self.choose(LAST_NAMES),
                self.choose(COMPANY_SUFFIXES)
            ),
            "company.suffix" => self.choose(COMPANY_SUFFIXES).to_string(),
            "job.title" => self.choose(JOB_TITLES).to_string(),
            "url" => format!(
                "https://www.{}.{}/",
                self.choose(WORDS),
                self.choose(DOMAIN_TLDS)
            ),
            "domain" => format!("{}.{}", self.choose(WORDS), self.choose(DOMAIN_TLDS)),
            "username" => format!(
                "{}{}",
                self.choose(FIRST_NAMES).to_lowercase(),
                self.rng.gen_range(1..1000)
            ),
            "ipv4" => format!(
                "{}.{}.{}.{}",
                self.rng.gen_range(1..255),
                self.rng.gen_range(0..256),
                self.rng.gen_range(0..256),
                self.rng.gen_range(1..255)
            ),
            "text.word" => self.choose(WORDS).to_string(),
            "text.sentence" => self.sentence(),
            "text.paragraph" => {
                let sentences: Vec<String> = (0..3).map(|_| self.sentence()).collect();
                sentences.join(" ")
            }
            "uuid" => uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid().to_string(),
            "code.alpha" => self.random_chars(UPPERCASE, 6),
            "code.numeric" => self.random_chars(DIGITS, 8),
            "code.alphanumeric" => {
                (0..8)
                    .map(|_| {
                        if self.rng.gen_bool(0.5) {
                            self.random_chars(UPPERCASE, 1)
                        } else {
                            self.random_chars(DIGITS, 1)
                        }
                    })
                    .collect()
            }
            "vehicle.vin" => self.random_chars(VIN_CHARS, 17),
            "vehicle.make" => self.choose(VEHICLE_MAKES).to_string(),
            "vehicle.model" => self.choose(VEHICLE_MODELS).to_string(),
            "vehicle.year" => self.rng.gen_range(2010..=2025).to_string(),
            "boolean" => if self.rng.gen_bool(0.5) { "true" } else { "false" }.to_string(),
            "yes_no" => if self.rng.gen_bool(0.5) { "Yes" } else { "No" }.to_string(),
            "y_n" => if self.rng.gen_bool(0.5) { "Y" } else { "N" }.to_string(),
            _ => return None,
        };
        Some(value)
    }

    fn generate_parameterized(&mut self, semantic_type: &str) -> String {
        let Some(captures) = PARAMETERIZED_RE.captures(semantic_type) else {
            return self.random_chars(LOWERCASE, 20);
        };
        let kind = &captures[1];
        let params: Vec<&str> = captures[2].split(',').map(str::trim).collect();

        let int_param = |i: usize, default: i64| -> i64 {
            params.get(i).and_then(|p| p.parse().ok()).unwrap_or(default)
        };
        let float_param = |i: usize, default: f64| -> f64 {
            params.get(i).and_then(|p| p.parse().ok()).unwrap_or(default)
        };

        match kind {
            "decimal" => {
                let min = float_param(0, 0.0);
                let max = float_param(1, 10_000.0).max(min);
                let decimals = int_param(2, 2).clamp(0, 10) as usize;
                format!("{:.decimals$}", self.uniform(min, max))
            }
            "integer" => {
                let min = int_param(0, 0);
                let max = int_param(1, 1000).max(min);
                self.rng.gen_range(min..=max).to_string()
            }
            "choice" => {
                if params.is_empty() || params == [""] {
                    String::new()
                } else {
                    (*params.choose(&mut self.rng).unwrap_or(&"")).to_string()
                }
            }
            "date" => {
                let min = int_param(0, -365);
                let max = int_param(1, 365).max(min);
                self.offset_date(min, max)
            }
            "year" => {
                let min = int_param(0, 2000);
                let max = int_param(1, 2025).max(min);
                self.rng.gen_range(min..=max).to_string()
            }
            "string" => {
                let length = if params.len() == 1 {
                    int_param(0, 10).max(1)
                } else {
                    let min = int_param(0, 5).max(1);
                    let max = int_param(1, 20).max(min);
                    self.rng.gen_range(min..=max)
                };
                self.random_chars(LOWERCASE, length as usize)
            }
            _ => self.random_chars(LOWERCASE, 20),
        }
    }

    /// Substitutes template placeholders: `{YYYY}` `{YY}` `{MM}` `{DD}`,
    /// runs of `#` for digits, runs of `A` for uppercase letters, and
    /// `{seq:N}` for N digits.
    fn generate_from_template(&mut self, template: &str) -> String {
        let mut result = template.to_string();

        let year = self.rng.gen_range(2020..=2025).to_string();
        result = result.replace("{YYYY}", &year);
        result = result.replace("{YY}", &year[2..]);
        let month = format!("{:02}", self.rng.gen_range(1..=12));
        result = result.replace("{MM}", &month);
        let day = format!("{:02}", self.rng.gen_range(1..=28));
        result = result.replace("{DD}", &day);

        while let Some((token, count)) = capture_run(&DIGIT_RUN_RE, &result) {
            let run = self.random_chars(DIGITS, count);
            result = result.replacen(&token, &run, 1);
        }
        while let Some((token, count)) = capture_run(&LETTER_RUN_RE, &result) {
            let run = self.random_chars(UPPERCASE, count);
            result = result.replacen(&token, &run, 1);
        }
        while let Some((token, digits)) = capture_seq(&result) {
            let run = self.random_chars(DIGITS, digits);
            result = result.replacen(&token, &run, 1);
        }

        result
    }

    fn sentence(&mut self) -> String {
        let count = self.rng.gen_range(6..=12);
        let mut words: Vec<&str> = (0..count).map(|_| self.choose(WORDS)).collect();
        let mut text = words.remove(0).to_string();
        if let Some(first) = text.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        for word in words {
            text.push(' ');
            text.push_str(word);
        }
        text.push('.');
        text
    }

    fn offset_date(&mut self, min_days: i64, max_days: i64) -> String {
        let days = self.rng.gen_range(min_days..=max_days);
        (Utc::now().date_naive() + Duration::days(days)).to_string()
    }

    fn offset_datetime(&mut self, min_days: i64, max_days: i64) -> String {
        let days = self.rng.gen_range(min_days..=max_days);
        let seconds = self.rng.gen_range(0..86_400);
        let moment = Utc::now() + Duration::days(days) + Duration::seconds(seconds);
        moment.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    fn choose<T: Copy>(&mut self, options: &[T]) -> T {
        options[self.rng.gen_range(0..options.len())]
    }

    fn random_chars(&mut self, alphabet: &[u8], length: usize) -> String {
        (0..length)
            .map(|_| alphabet[self.rng.gen_range(0..alphabet.len())] as char)
            .collect()
    }

    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }
}

/// Normalized XSD primitive families. Keeping the facet match on this
/// enum exhaustive means new variants cannot silently fall through to
/// string handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseType {
    Integer,
    Decimal,
    Date,
    DateTime,
    Boolean,
    Text,
}

fn normalize_base_type(token: &str) -> BaseType {
    match token.to_ascii_lowercase().as_str() {
        "integer" | "int" | "long" | "short" | "byte" | "nonnegativeinteger"
        | "positiveinteger" | "nonpositiveinteger" | "negativeinteger" | "unsignedint"
        | "unsignedlong" | "unsignedshort" | "unsignedbyte" => BaseType::Integer,
        "decimal" | "float" | "double" => BaseType::Decimal,
        "date" => BaseType::Date,
        "datetime" => BaseType::DateTime,
        "boolean" => BaseType::Boolean,
        _ => BaseType::Text,
    }
}

/// Generates values from XSD type constraints when no semantic type is
/// bound. Priority: enumeration, then a bounded pattern subset, then the
/// base type with facets applied.
pub struct XsdValueGenerator {
    rng: StdRng,
}

impl XsdValueGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: seeded(seed) }
    }

    pub fn generate(&mut self, type_def: Option<&XsdSimpleType>) -> String {
        let Some(type_def) = type_def else {
            return self.random_string(1, 20);
        };

        if let Some(values) = &type_def.enumeration {
            if !values.is_empty() {
                let index = self.rng.gen_range(0..values.len());
                return values[index].clone();
            }
        }

        if let Some(pattern) = &type_def.pattern {
            return self.generate_from_pattern(pattern, type_def);
        }

        match normalize_base_type(&type_def.base_type) {
            BaseType::Integer => self.generate_integer(type_def),
            BaseType::Decimal => self.generate_decimal(type_def),
            BaseType::Date => self.generate_date(),
            BaseType::DateTime => self.generate_datetime(),
            BaseType::Boolean => if self.rng.gen_bool(0.5) { "true" } else { "false" }.to_string(),
            BaseType::Text => self.generate_string(type_def),
        }
    }

    fn generate_integer(&mut self, type_def: &XsdSimpleType) -> String {
        let mut min = type_def.min_value.map_or(0, |v| v as i64);
        let mut max = type_def.max_value.map_or(10_000, |v| v as i64);
        if let Some(digits) = type_def.total_digits {
            let cap = 10_i64.saturating_pow(digits.min(18)) - 1;
            max = max.min(cap);
            min = min.max(-cap);
        }
        if min > max {
            max = min;
        }
        self.rng.gen_range(min..=max).to_string()
    }

    fn generate_decimal(&mut self, type_def: &XsdSimpleType) -> String {
        let min = type_def.min_value.unwrap_or(0.0);
        let max = type_def.max_value.unwrap_or(10_000.0).max(min);
        let decimals = type_def.fraction_digits.unwrap_or(2).min(10) as usize;
        let value = if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        };
        format!("{value:.decimals$}")
    }

    fn generate_date(&mut self) -> String {
        let days = self.rng.gen_range(0..3650);
        (Utc::now().date_naive() - Duration::days(days)).to_string()
    }

    fn generate_datetime(&mut self) -> String {
        let days = self.rng.gen_range(0..3650);
        let seconds = self.rng.gen_range(0..86_400);
        let moment = Utc::now() - Duration::days(days) - Duration::seconds(seconds);
        moment.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    fn generate_string(&mut self, type_def: &XsdSimpleType) -> String {
        let min = type_def.min_length.unwrap_or(1).max(1);
        let max = type_def.max_length.unwrap_or(50).max(min);
        let length = self.rng.gen_range(min..=max);
        self.random_string(length, length)
    }

    /// Bounded pattern subset: `[A-Z]{n}` and `[0-9]{n}`. Anything else
    /// falls back to a facet-respecting string; schemas with load-bearing
    /// patterns should bind those paths to a `pattern:` semantic type.
    fn generate_from_pattern(&mut self, pattern: &str, type_def: &XsdSimpleType) -> String {
        if let Some(captures) = UPPER_RUN_PATTERN_RE.captures(pattern) {
            let count: usize = captures[1].parse().unwrap_or(1);
            return (0..count)
                .map(|_| UPPERCASE[self.rng.gen_range(0..UPPERCASE.len())] as char)
                .collect();
        }
        if let Some(captures) = DIGIT_RUN_PATTERN_RE.captures(pattern) {
            let count: usize = captures[1].parse().unwrap_or(1);
            return (0..count)
                .map(|_| DIGITS[self.rng.gen_range(0..DIGITS.len())] as char)
                .collect();
        }
        self.generate_string(type_def)
    }

    fn random_string(&mut self, min: usize, max: usize) -> String {
        let length = if max > min {
            self.rng.gen_range(min..=max)
        } else {
            min
        };
        (0..length)
            .map(|_| LOWERCASE[self.rng.gen_range(0..LOWERCASE.len())] as char)
            .collect()
    }
}

fn capture_run(re: &Regex, text: &str) -> Option<(String, usize)> {
    re.captures(text)
        .map(|c| (c[0].to_string(), c[1].len()))
}

fn capture_seq(text: &str) -> Option<(String, usize)> {
    SEQ_RE
        .captures(text)
        .map(|c| (c[0].to_string(), c[1].parse().unwrap_or(1)))
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ValueRegistry {
        ValueRegistry::new(None)
    }

    #[test]
    fn every_named_kind_generates_a_value() {
        let mut registry = registry();
        for kind in NAMED_KINDS {
            let value = registry
                .generate_named(kind)
                .unwrap_or_else(|| panic!("kind {kind} is registered but not implemented"));
            assert!(!value.is_empty(), "kind {kind} produced an empty value");
        }
    }

    #[test]
    fn ssn_shape() {
        let mut registry = registry();
        for _ in 0..20 {
            let ssn = registry.generate("ssn");
            assert_eq!(ssn.len(), 11);
            let parts: Vec<&str> = ssn.split('-').collect();
            assert_eq!(parts.len(), 3);
            assert_eq!((parts[0].len(), parts[1].len(), parts[2].len()), (3, 2, 4));
        }
    }

    #[test]
    fn email_contains_at_sign() {
        let mut registry = registry();
        let email = registry.generate("email");
        assert!(email.contains('@'));
        assert!(email.contains('.'));
    }

    #[test]
    fn state_abbr_is_two_uppercase_letters() {
        let mut registry = registry();
        for _ in 0..20 {
            let abbr = registry.generate("address.state_abbr");
            assert_eq!(abbr.len(), 2);
            assert!(abbr.chars().all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn zipcode_is_five_digits() {
        let mut registry = registry();
        for _ in 0..20 {
            let zip = registry.generate("address.zipcode");
            assert_eq!(zip.len(), 5);
            assert!(zip.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn past_and_future_dates_are_ordered_around_today() {
        let mut registry = registry();
        let today = Utc::now().date_naive().to_string();
        for _ in 0..20 {
            assert!(registry.generate("date.past") <= today);
            assert!(registry.generate("date.future") > today);
        }
    }

    #[test]
    fn boolean_kinds_stay_in_domain() {
        let mut registry = registry();
        for _ in 0..20 {
            assert!(["true", "false"].contains(&registry.generate("boolean").as_str()));
            assert!(["Yes", "No"].contains(&registry.generate("yes_no").as_str()));
            assert!(["Y", "N"].contains(&registry.generate("y_n").as_str()));
        }
    }

    #[test]
    fn vin_is_seventeen_chars_without_ioq() {
        let mut registry = registry();
        let vin = registry.generate("vehicle.vin");
        assert_eq!(vin.len(), 17);
        assert!(!vin.contains('I') && !vin.contains('O') && !vin.contains('Q'));
    }

    #[test]
    fn parameterized_decimal_respects_range_and_precision() {
        let mut registry = registry();
        for _ in 0..50 {
            let value = registry.generate("decimal(100, 1000, 2)");
            let parsed: f64 = value.parse().unwrap();
            assert!((100.0..=1000.0).contains(&parsed));
            assert_eq!(value.split('.').nth(1).map(str::len), Some(2));
        }
    }

    #[test]
    fn parameterized_integer_respects_range() {
        let mut registry = registry();
        for _ in 0..50 {
            let value: i64 = registry.generate("integer(10, 20)").parse().unwrap();
            assert!((10..=20).contains(&value));
        }
    }

    #[test]
    fn parameterized_year_and_choice() {
        let mut registry = registry();
        for _ in 0..50 {
            let year: i64 = registry.generate("year(1990, 1999)").parse().unwrap();
            assert!((1990..=1999).contains(&year));
            let choice = registry.generate("choice(A, B, C)");
            assert!(["A", "B", "C"].contains(&choice.as_str()));
        }
    }

    #[test]
    fn parameterized_string_lengths() {
        let mut registry = registry();
        assert_eq!(registry.generate("string(8)").len(), 8);
        for _ in 0..50 {
            let len = registry.generate("string(3, 6)").len();
            assert!((3..=6).contains(&len));
        }
    }

    #[test]
    fn pattern_template_substitution() {
        let mut registry = registry();
        for _ in 0..20 {
            let value = registry.generate("pattern:{YYYY}-{MM}-{DD}");
            let parts: Vec<&str> = value.split('-').collect();
            assert_eq!(parts.len(), 3);
            let year: i32 = parts[0].parse().unwrap();
            assert!((2020..=2025).contains(&year));

            let digits = registry.generate("pattern:INV-{######}");
            assert!(digits.starts_with("INV-"));
            assert_eq!(digits.len(), 10);
            assert!(digits[4..].chars().all(|c| c.is_ascii_digit()));

            let letters = registry.generate("pattern:{AAA}-{seq:4}");
            assert_eq!(letters.len(), 8);
            assert!(letters[..3].chars().all(|c| c.is_ascii_uppercase()));
            assert!(letters[4..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn unknown_token_falls_back_to_a_short_string() {
        let mut registry = registry();
        let value = registry.generate("no.such.kind");
        assert!(!value.is_empty());
        assert!(value.len() <= 20);
    }

    #[test]
    fn has_semantic_type_recognizes_all_shapes() {
        let registry = registry();
        assert!(registry.has_semantic_type("email"));
        assert!(registry.has_semantic_type("decimal(1, 2, 3)"));
        assert!(registry.has_semantic_type("pattern:{####}"));
        assert!(!registry.has_semantic_type("no.such.kind"));
    }

    #[test]
    fn registry_is_reproducible_with_a_seed() {
        let run = || {
            let mut registry = ValueRegistry::new(Some(7));
            (0..20)
                .map(|_| registry.generate("person.full_name"))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    fn simple(base: &str) -> XsdSimpleType {
        XsdSimpleType::with_base(base)
    }

    #[test]
    fn xsd_enumeration_is_authoritative() {
        let mut generator = XsdValueGenerator::new(None);
        let mut type_def = simple("string");
        type_def.enumeration = Some(vec!["A".to_string(), "B".to_string()]);
        for _ in 0..50 {
            let value = generator.generate(Some(&type_def));
            assert!(["A", "B"].contains(&value.as_str()));
        }
    }

    #[test]
    fn xsd_integer_respects_facets() {
        let mut generator = XsdValueGenerator::new(None);
        let mut type_def = simple("integer");
        type_def.min_value = Some(5.0);
        type_def.max_value = Some(9.0);
        for _ in 0..50 {
            let value: i64 = generator.generate(Some(&type_def)).parse().unwrap();
            assert!((5..=9).contains(&value));
        }
    }

    #[test]
    fn xsd_total_digits_caps_magnitude() {
        let mut generator = XsdValueGenerator::new(None);
        let mut type_def = simple("integer");
        type_def.total_digits = Some(2);
        for _ in 0..50 {
            let value: i64 = generator.generate(Some(&type_def)).parse().unwrap();
            assert!(value <= 99);
        }
    }

    #[test]
    fn xsd_decimal_respects_fraction_digits() {
        let mut generator = XsdValueGenerator::new(None);
        let mut type_def = simple("decimal");
        type_def.min_value = Some(1.0);
        type_def.max_value = Some(2.0);
        type_def.fraction_digits = Some(3);
        for _ in 0..50 {
            let value = generator.generate(Some(&type_def));
            assert_eq!(value.split('.').nth(1).map(str::len), Some(3));
            let parsed: f64 = value.parse().unwrap();
            assert!((1.0..=2.0).contains(&parsed));
        }
    }

    #[test]
    fn xsd_string_respects_length_facets() {
        let mut generator = XsdValueGenerator::new(None);
        let mut type_def = simple("string");
        type_def.min_length = Some(4);
        type_def.max_length = Some(6);
        for _ in 0..50 {
            let len = generator.generate(Some(&type_def)).len();
            assert!((4..=6).contains(&len));
        }
    }

    #[test]
    fn xsd_boolean_and_date_shapes() {
        let mut generator = XsdValueGenerator::new(None);
        for _ in 0..20 {
            let boolean = generator.generate(Some(&simple("boolean")));
            assert!(["true", "false"].contains(&boolean.as_str()));

            let date = generator.generate(Some(&simple("date")));
            assert_eq!(date.len(), 10);
            assert_eq!(date.matches('-').count(), 2);

            let datetime = generator.generate(Some(&simple("dateTime")));
            assert!(datetime.contains('T'));
        }
    }

    #[test]
    fn xsd_bounded_pattern_subset() {
        let mut generator = XsdValueGenerator::new(None);
        let mut letters = simple("string");
        letters.pattern = Some("[A-Z]{3}".to_string());
        let mut digits = simple("string");
        digits.pattern = Some("[0-9]{5}".to_string());

        for _ in 0..20 {
            let value = generator.generate(Some(&letters));
            assert_eq!(value.len(), 3);
            assert!(value.chars().all(|c| c.is_ascii_uppercase()));

            let value = generator.generate(Some(&digits));
            assert_eq!(value.len(), 5);
            assert!(value.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn xsd_none_type_still_produces_text() {
        let mut generator = XsdValueGenerator::new(None);
        assert!(!generator.generate(None).is_empty());
    }

    #[test]
    fn xsd_generator_is_reproducible_with_a_seed() {
        let run = || {
            let mut generator = XsdValueGenerator::new(Some(11));
            (0..20)
                .map(|_| generator.generate(Some(&simple("string"))))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
