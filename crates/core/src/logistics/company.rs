use serde::Serialize;

const TOPICS: [&str; 6] = ["overview", "services", "hours", "contact", "pickup", "claims"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CompanyInfo {
    Found { topic: String, information: String },
    NotFound { error: &'static str, topic: String, available_topics: Vec<&'static str> },
}

/// Canned answers about the company, keyed by topic.
#[derive(Clone, Debug)]
pub struct CompanyDirectory {
    company_name: String,
}

impl CompanyDirectory {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self { company_name: company_name.into() }
    }

    pub fn topics(&self) -> &'static [&'static str] {
        &TOPICS
    }

    pub fn lookup(&self, raw_topic: &str) -> CompanyInfo {
        let topic = raw_topic.trim().to_ascii_lowercase();
        let name = &self.company_name;
        let information = match topic.as_str() {
            "overview" | "about" => format!(
                "{name} is a logistics company offering parcel and freight shipping with \
                 door-to-door tracking."
            ),
            "services" => "Standard ground (3-7 business days), express (1-2 business days), \
                 freight for packages over 150 lbs, and scheduled pickups."
                .to_string(),
            "hours" => "Customer service is available Monday to Friday 8am-8pm and Saturday \
                 9am-5pm local time."
                .to_string(),
            "contact" => format!(
                "Reach {name} support by replying in this chat or by phone at 1-800-555-0199."
            ),
            "pickup" => "Pickups can be scheduled for the next business day when requested \
                 before 6pm. Have the package sealed and labelled before the driver arrives."
                .to_string(),
            "claims" => "Damage or loss claims must be filed within 30 days of the delivery \
                 date with the order id, photos of the package, and proof of value."
                .to_string(),
            _ => {
                return CompanyInfo::NotFound {
                    error: "Topic not found",
                    topic: raw_topic.to_string(),
                    available_topics: TOPICS.to_vec(),
                }
            }
        };

        let topic = if topic == "about" { "overview".to_string() } else { topic };
        CompanyInfo::Found { topic, information }
    }
}
