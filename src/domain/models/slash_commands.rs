#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    rest: String,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let trimmed = text.trim();
        let (prefix, rest) = match trimmed.split_once(' ') {
            Some((prefix, rest)) => (prefix, rest.trim()),
            None => (trimmed, ""),
        };

        let cmd = SlashCommand {
            command: prefix.to_string(),
            rest: rest.to_string(),
        };
        if cmd.is_quit()
            || cmd.is_quote()
            || cmd.is_dismiss_quote()
            || cmd.is_model_list()
            || cmd.is_model_set()
            || cmd.is_help()
        {
            return Some(cmd);
        }

        return None;
    }

    /// Everything after the command, with surrounding whitespace removed.
    pub fn rest(&self) -> &str {
        return &self.rest;
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_quote(&self) -> bool {
        return ["/quote"].contains(&self.command.as_str()) && !self.rest.is_empty();
    }

    pub fn is_dismiss_quote(&self) -> bool {
        return ["/d", "/dismiss"].contains(&self.command.as_str());
    }

    pub fn is_model_list(&self) -> bool {
        return ["/ml", "/modellist"].contains(&self.command.as_str());
    }

    pub fn is_model_set(&self) -> bool {
        return ["/m", "/model"].contains(&self.command.as_str()) && !self.rest.is_empty();
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }
}
