// Text-entry forms: field values, focus and inline messages.

/// A single labelled input.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    /// Masked unless the form's secrets are revealed.
    pub secret: bool,
}

impl Field {
    pub fn text(label: &'static str) -> Self {
        Field {
            label,
            value: String::new(),
            secret: false,
        }
    }

    pub fn secret(label: &'static str) -> Self {
        Field {
            label,
            value: String::new(),
            secret: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub fields: Vec<Field>,
    pub focus: usize,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub reveal_secrets: bool,
}

// Field positions for each form.
pub const EMAIL: usize = 0;
pub const PASSWORD: usize = 1;
pub const CONFIRM_PASSWORD: usize = 2;
pub const TOPIC: usize = 0;
pub const QUESTION_COUNT: usize = 1;
pub const FULL_NAME: usize = 0;
pub const AVATAR_PATH: usize = 1;

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        Form {
            fields,
            focus: 0,
            error: None,
            notice: None,
            reveal_secrets: false,
        }
    }

    pub fn login() -> Self {
        Form::new(vec![Field::text("Email"), Field::secret("Password")])
    }

    pub fn register() -> Self {
        Form::new(vec![
            Field::text("Email"),
            Field::secret("Password"),
            Field::secret("Confirm Password"),
        ])
    }

    pub fn forgot_password() -> Self {
        Form::new(vec![Field::text("Email")])
    }

    pub fn generate(default_questions: u32) -> Self {
        let mut form = Form::new(vec![
            Field::text("Topic"),
            Field::text("Number of Questions"),
        ]);
        form.fields[QUESTION_COUNT].value = default_questions.to_string();
        form
    }

    pub fn profile() -> Self {
        Form::new(vec![Field::text("Full Name"), Field::text("Avatar File")])
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(index) {
            field.value = value.into();
        }
    }

    /// Value as shown on screen, masked for secret fields.
    pub fn display_value(&self, index: usize) -> String {
        match self.fields.get(index) {
            Some(f) if f.secret && !self.reveal_secrets => "*".repeat(f.value.chars().count()),
            Some(f) => f.value.clone(),
            None => String::new(),
        }
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn is_last_field(&self) -> bool {
        self.focus + 1 >= self.fields.len()
    }

    pub fn insert_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    pub fn toggle_reveal(&mut self) {
        self.reveal_secrets = !self.reveal_secrets;
    }

    /// Empty every field and message and return focus to the top.
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.focus = 0;
        self.error = None;
        self.notice = None;
        self.reveal_secrets = false;
    }

    pub fn clear_messages(&mut self) {
        self.error = None;
        self.notice = None;
    }

    /// Label of the first blank field, if any.
    pub fn first_blank(&self) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.value.trim().is_empty())
            .map(|f| f.label)
    }
}
