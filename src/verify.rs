/// Display-only verification badge for a profile.
///
/// Students need an `.edu` mailbox; sponsors need a mail domain that
/// contains their organisation name with whitespace removed. Any other
/// role is never verified.
pub fn verify(email: &str, role: &str, org: &str) -> bool {
    let domain = match email.split_once('@') {
        Some((_, domain)) if !domain.is_empty() => domain.to_lowercase(),
        _ => return false,
    };
    match role {
        "student" => domain.ends_with(".edu"),
        "sponsor" => {
            if org.is_empty() {
                return false;
            }
            let org: String = org
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase();
            domain.contains(&org)
        }
        _ => false,
    }
}
