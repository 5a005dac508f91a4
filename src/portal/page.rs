use crate::error::ConnectionError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static FORMS: Lazy<Selector> = Lazy::new(|| Selector::parse("form").expect("valid selector"));
static FIELDS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("input[name], select[name], textarea[name]").expect("valid selector")
});
static OPTIONS: Lazy<Selector> = Lazy::new(|| Selector::parse("option").expect("valid selector"));

/// A fetched document and the address it was finally served from.
///
/// Only the raw body is kept; callers parse it on demand so that no parsed
/// tree is ever held across an await point.
#[derive(Debug, Clone)]
pub struct Page {
    url: Url,
    body: String,
}

impl Page {
    pub fn new(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }

    /// Finds a form by `id`, falling back to its `name` attribute.
    pub fn form(&self, id: &str) -> Result<Form, ConnectionError> {
        let document = self.document();
        let element = document
            .select(&FORMS)
            .find(|form| form.value().id() == Some(id))
            .or_else(|| {
                document
                    .select(&FORMS)
                    .find(|form| form.value().attr("name") == Some(id))
            })
            .ok_or_else(|| ConnectionError::FormNotFound(id.to_string()))?;

        Form::from_element(id, element, &self.url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

/// A login form with its current field values, ready to be submitted.
#[derive(Debug, Clone)]
pub struct Form {
    id: String,
    action: Url,
    method: FormMethod,
    fields: Vec<(String, String)>,
}

impl Form {
    fn from_element(id: &str, element: ElementRef<'_>, page_url: &Url) -> Result<Self, ConnectionError> {
        let action = match element.value().attr("action").map(str::trim) {
            None | Some("") => page_url.clone(),
            Some(action) => page_url
                .join(action)
                .map_err(|source| ConnectionError::InvalidUrl {
                    url: action.to_string(),
                    source,
                })?,
        };
        let method = match element.value().attr("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => FormMethod::Post,
            _ => FormMethod::Get,
        };
        let fields = element.select(&FIELDS).filter_map(field_value).collect();

        Ok(Self {
            id: id.to_string(),
            action,
            method,
            fields,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn action(&self) -> &Url {
        &self.action
    }

    pub fn method(&self) -> FormMethod {
        self.method
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Overwrites an existing field. Unknown names are an error since the
    /// portal would silently ignore them.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), ConnectionError> {
        let slot = self
            .fields
            .iter_mut()
            .find(|(field, _)| field == name)
            .ok_or_else(|| ConnectionError::MissingField {
                form: self.id.clone(),
                field: name.to_string(),
            })?;
        slot.1 = value.into();
        Ok(())
    }
}

fn field_value(element: ElementRef<'_>) -> Option<(String, String)> {
    let node = element.value();
    let name = node.attr("name")?.to_string();
    match node.name() {
        "input" => {
            let kind = node.attr("type").unwrap_or("text").to_ascii_lowercase();
            match kind.as_str() {
                "submit" | "button" | "image" | "reset" | "file" => None,
                "checkbox" | "radio" => node
                    .attr("checked")
                    .map(|_| (name, node.attr("value").unwrap_or("on").to_string())),
                _ => Some((name, node.attr("value").unwrap_or_default().to_string())),
            }
        }
        "select" => {
            let options: Vec<ElementRef<'_>> = element.select(&OPTIONS).collect();
            let chosen = options
                .iter()
                .find(|option| option.value().attr("selected").is_some())
                .or_else(|| options.first())?;
            let value = chosen
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| chosen.text().collect::<String>().trim().to_string());
            Some((name, value))
        }
        "textarea" => Some((name, element.text().collect())),
        _ => None,
    }
}
