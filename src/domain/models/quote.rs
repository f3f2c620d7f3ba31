#[cfg(test)]
#[path = "quote_test.rs"]
mod tests;

/// Selected page text waiting to be attached to the next message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote(String);

impl Quote {
    pub fn new(text: &str) -> Option<Quote> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        return Some(Quote(trimmed.to_string()));
    }

    pub fn text(&self) -> &str {
        return &self.0;
    }
}

/// A user submission in the two shapes it takes: what the model receives,
/// and what the transcript shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserTurn {
    pub committed: String,
    pub displayed: String,
}

impl UserTurn {
    pub fn compose(text: &str, quote: Option<&Quote>) -> UserTurn {
        return match quote {
            Some(quote) => UserTurn {
                committed: format!("<quote>{}</quote>\n\n{text}", quote.text()),
                displayed: format!("Quote: \"{}\"\n\n{text}", quote.text()),
            },
            None => UserTurn {
                committed: text.to_string(),
                displayed: text.to_string(),
            },
        };
    }
}
