use crate::preferences::PreferenceStore;
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const QUOTE_DATE_KEY: &str = "quoteDate";
pub const DAILY_QUOTE_KEY: &str = "dailyQuote";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

pub const QUOTES: &[(&str, &str)] = &[
    ("O sucesso é a soma de pequenos esforços repetidos dia após dia.", "Robert Collier"),
    ("A disciplina é a ponte entre metas e conquistas.", "Jim Rohn"),
    ("Não espere por oportunidades. Crie-as.", "Desconhecido"),
    ("O único modo de fazer um ótimo trabalho é amar o que você faz.", "Steve Jobs"),
    ("Acredite que você pode e você já está no meio do caminho.", "Theodore Roosevelt"),
    ("O futuro pertence àqueles que acreditam na beleza de seus sonhos.", "Eleanor Roosevelt"),
];

/// Quote shown by the motivational widget. The pick is cached locally and
/// reused for the rest of `today`.
pub fn quote_of_the_day(store: &PreferenceStore, today: NaiveDate, rng: &mut impl Rng) -> Quote {
    let today_key = today.format("%Y-%m-%d").to_string();
    if store.get_local::<String>(QUOTE_DATE_KEY).as_deref() == Some(today_key.as_str()) {
        if let Some(quote) = store.get_local::<Quote>(DAILY_QUOTE_KEY) {
            return quote;
        }
    }
    let (text, author) = QUOTES[rng.gen_range(0..QUOTES.len())];
    let quote = Quote {
        text: text.to_string(),
        author: author.to_string(),
    };
    store.set_local(QUOTE_DATE_KEY, &today_key);
    store.set_local(DAILY_QUOTE_KEY, &quote);
    quote
}
