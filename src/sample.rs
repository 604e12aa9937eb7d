//! Demo dataset served when the events table cannot be read, and used to
//! seed an empty database.

use chrono::{Duration, Utc};

use crate::models::{Event, Organiser};

pub const DEFAULT_POSTER: &str = "/assets/placeholder.svg";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn sample_events() -> Vec<Event> {
    let now = Utc::now();
    vec![
        Event {
            id: "hack-001".into(),
            title: "TechFest Hackathon 2025".into(),
            description: "48-hour campus hackathon focusing on AI for social good.".into(),
            date: now + Duration::days(30),
            audience_size: 600,
            packages: strings(&["Title Sponsor", "Gold", "Silver"]),
            benefits: strings(&["Logo on stage", "Booth space", "Keynote mention"]),
            tags: strings(&["tech", "hackathon", "ai"]),
            location: "Boston, MA".into(),
            poster: DEFAULT_POSTER.into(),
            organiser: Organiser {
                name: "Priya Sharma".into(),
                college: "MIT".into(),
                verified: true,
            },
        },
        Event {
            id: "cultural-101".into(),
            title: "Spring Cultural Carnival".into(),
            description: "Celebrate diversity with performances, food stalls, and workshops.".into(),
            date: now + Duration::days(60),
            audience_size: 1200,
            packages: strings(&["Presenting Sponsor", "Community Partner"]),
            benefits: strings(&["Stage branding", "Social shoutouts", "VIP passes"]),
            tags: strings(&["cultural", "festival"]),
            location: "Austin, TX".into(),
            poster: DEFAULT_POSTER.into(),
            organiser: Organiser {
                name: "Diego Lopez".into(),
                college: "UT Austin".into(),
                verified: true,
            },
        },
        Event {
            id: "sports-050".into(),
            title: "Inter-College Sports Meet".into(),
            description: "Three-day sports tournament featuring track, basketball, and soccer.".into(),
            date: now + Duration::days(80),
            audience_size: 2000,
            packages: strings(&["Platinum", "Gold", "Silver"]),
            benefits: strings(&["Jersey branding", "On-field banners", "Award ceremony mention"]),
            tags: strings(&["sports", "tournament"]),
            location: "Palo Alto, CA".into(),
            poster: DEFAULT_POSTER.into(),
            organiser: Organiser {
                name: "Ava Chen".into(),
                college: "Stanford University".into(),
                verified: true,
            },
        },
    ]
}
