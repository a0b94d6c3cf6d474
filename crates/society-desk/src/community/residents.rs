use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resident {
    pub id: String,
    pub name: String,
    pub flat: String,
    pub phone: String,
    pub email: String,
    pub image_url: String,
}

/// Residents directory with a free-text search box.
#[derive(Debug, Clone, Default)]
pub struct ResidentDirectory {
    residents: Vec<Resident>,
}

impl ResidentDirectory {
    pub fn new(residents: Vec<Resident>) -> Self {
        Self { residents }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            resident(
                "1",
                "Sarah Johnson",
                "A-101",
                "+1 (555) 123-4567",
                "sarah.j@example.com",
                "https://images.unsplash.com/photo-1494790108377-be9c29b29330?w=400",
            ),
            resident(
                "2",
                "Michael Chen",
                "B-205",
                "+1 (555) 234-5678",
                "michael.c@example.com",
                "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400",
            ),
            resident(
                "3",
                "Emily Rodriguez",
                "C-304",
                "+1 (555) 345-6789",
                "emily.r@example.com",
                "https://images.unsplash.com/photo-1438761681033-6461ffad8d80?w=400",
            ),
        ])
    }

    pub fn all(&self) -> &[Resident] {
        &self.residents
    }

    /// Residents whose name, flat or email contains `term`, ignoring case.
    /// A blank term returns everyone.
    pub fn search(&self, term: &str) -> Vec<Resident> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.residents.clone();
        }
        self.residents
            .iter()
            .filter(|resident| {
                [&resident.name, &resident.flat, &resident.email]
                    .into_iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }
}

fn resident(
    id: &str,
    name: &str,
    flat: &str,
    phone: &str,
    email: &str,
    image_url: &str,
) -> Resident {
    Resident {
        id: id.to_string(),
        name: name.to_string(),
        flat: flat.to_string(),
        phone: phone.to_string(),
        email: email.to_string(),
        image_url: image_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(residents: &[Resident]) -> Vec<&str> {
        residents.iter().map(|resident| resident.name.as_str()).collect()
    }

    #[test]
    fn blank_search_returns_everyone() {
        let directory = ResidentDirectory::standard();
        assert_eq!(directory.search("  ").len(), 3);
    }

    #[test]
    fn search_covers_name_flat_and_email() {
        let directory = ResidentDirectory::standard();

        assert_eq!(names(&directory.search("chen")), vec!["Michael Chen"]);
        assert_eq!(names(&directory.search("c-304")), vec!["Emily Rodriguez"]);
        assert_eq!(names(&directory.search("SARAH.J@")), vec!["Sarah Johnson"]);
        assert!(directory.search("555").is_empty(), "phone is not searched");
    }
}
