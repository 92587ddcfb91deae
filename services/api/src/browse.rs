use crate::cli::{BrowseArgs, DataArgs, ListArgs};
use crate::infra::{fetch_dataset, load_config};
use chrono::{Datelike, Local};
use lehrstellen::error::AppError;
use lehrstellen::listing::view::matching_count;
use lehrstellen::listing::{
    derive_view, total_pages, ContactView, FilterState, ListingError, ListingSession,
    PaginationControls, PostingCard, PostingId, Ticket, Transition, ViewModel, WidgetState,
};
use lehrstellen::telemetry;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::debug;

const HELP: &str = "\
Befehle:
  canton CODE|-     Kanton wählen, '-' für alle Kantone
  beruf NAME|NR|-   Ausbildungsberuf wählen, '-' für alle Berufe
  berufe            Verfügbare Ausbildungsberufe anzeigen
  seite NR          Zu Seite NR springen
  weiter, zurück    Nächste oder vorherige Seite
  kontakt NR        Kontaktdaten des Lehrbetriebs NR anzeigen
  hilfe             Diese Übersicht
  ende              Beenden";

/// Year shown on open postings whose entry carries none.
pub(crate) fn current_year() -> i32 {
    Local::now().year()
}

pub(crate) fn render_view(view: &ViewModel, fallback_year: i32) -> String {
    ListingText {
        view,
        fallback_year,
    }
    .to_string()
}

pub(crate) fn render_contact(contact: &ContactView, fallback_year: i32) -> String {
    ContactText {
        contact,
        fallback_year,
    }
    .to_string()
}

pub(crate) fn render_pager(controls: &PaginationControls) -> String {
    PagerText(controls).to_string()
}

/// One listing frame: filter line, both sections and the pager.
struct ListingText<'a> {
    view: &'a ViewModel,
    fallback_year: i32,
}

impl fmt::Display for ListingText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.view;
        let canton = view.filter.canton.as_deref().unwrap_or("alle");
        let profession = view.filter.profession.as_deref().unwrap_or("alle");
        writeln!(f, "Kanton: {canton} | Ausbildungsberuf: {profession}")?;

        if view.is_empty() {
            return writeln!(f, "Keine Lehrbetriebe gefunden.");
        }

        writeln!(
            f,
            "{} Lehrbetriebe, Seite {} von {}",
            view.total_items, view.page, view.total_pages
        )?;

        for (heading, cards) in [
            ("Offene Lehrstellen", &view.open),
            ("Weitere Lehrbetriebe", &view.other),
        ] {
            if cards.is_empty() {
                continue;
            }
            writeln!(f, "\n{heading}")?;
            for card in cards {
                write_card(f, card, self.fallback_year)?;
            }
        }

        if let Some(controls) = &view.pagination {
            writeln!(f, "\n{}", PagerText(controls))?;
        }
        Ok(())
    }
}

fn write_card(f: &mut fmt::Formatter<'_>, card: &PostingCard, fallback_year: i32) -> fmt::Result {
    writeln!(f, "  [{}] {}", card.id, card.profession)?;
    writeln!(f, "      {}", card.location_name)?;
    writeln!(f, "      {}", card.street_line)?;
    writeln!(f, "      {}", card.locality_line)?;
    let marker = if card.open_apprenticeship { '●' } else { '○' };
    let year = card.open_year.unwrap_or(fallback_year);
    writeln!(
        f,
        "      {marker} Offene Lehrstelle {year} | Schnupperlehre auf Anfrage möglich"
    )
}

/// Page numbers of the visible window, current page in brackets.
/// Disabled arrows are shown in parentheses.
struct PagerText<'a>(&'a PaginationControls);

impl fmt::Display for PagerText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let controls = self.0;
        f.write_str(if controls.previous.is_some() { "«" } else { "(«)" })?;
        for page in controls.window.pages() {
            if page == controls.current {
                write!(f, " [{page}]")?;
            } else {
                write!(f, " {page}")?;
            }
        }
        f.write_str(if controls.next.is_some() { " »" } else { " (»)" })
    }
}

struct ContactText<'a> {
    contact: &'a ContactView,
    fallback_year: i32,
}

impl fmt::Display for ContactText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contact = self.contact;
        let card = &contact.card;
        writeln!(f, "{}", card.profession)?;
        writeln!(f, "{}", card.location_name)?;
        writeln!(f, "{}", card.street_line)?;
        writeln!(f, "{}", card.locality_line)?;

        writeln!(f, "\nKontaktdaten Bewerbung")?;
        let mut details = [&contact.contact_name, &contact.email, &contact.phone]
            .into_iter()
            .flatten()
            .peekable();
        if details.peek().is_none() {
            writeln!(f, "  keine Angaben")?;
        }
        for line in details {
            writeln!(f, "  {line}")?;
        }

        if card.open_apprenticeship {
            let year = card.open_year.unwrap_or(self.fallback_year);
            writeln!(f, "\nOffene Lehrstelle {year}")?;
        }
        if let Some(website) = &contact.website {
            writeln!(f, "\nMehr über das Unternehmen erfahren: {website}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Intent {
    Canton(Option<String>),
    Profession(Option<String>),
    Page(usize),
    Next,
    Previous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    Change(Intent),
    Contact(PostingId),
    Professions,
    Help,
    Quit,
}

impl BrowseCommand {
    /// `professions` resolves numeric `beruf` arguments (1-based) to a name.
    fn parse(line: &str, professions: &[String]) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let argument = (!rest.is_empty() && rest != "-").then(|| rest.to_string());

        let command = match word.to_lowercase().as_str() {
            "canton" | "kanton" => BrowseCommand::Change(Intent::Canton(argument)),
            "beruf" => {
                let profession = match argument {
                    Some(raw) => match raw.parse::<usize>() {
                        Ok(index) => Some(
                            index
                                .checked_sub(1)
                                .and_then(|i| professions.get(i))
                                .cloned()
                                .ok_or_else(|| format!("Kein Ausbildungsberuf Nr. {index}"))?,
                        ),
                        Err(_) => Some(raw),
                    },
                    None => None,
                };
                BrowseCommand::Change(Intent::Profession(profession))
            }
            "berufe" => BrowseCommand::Professions,
            "seite" => {
                let page = rest
                    .parse::<usize>()
                    .map_err(|_| format!("Ungültige Seitenzahl: '{rest}'"))?;
                BrowseCommand::Change(Intent::Page(page))
            }
            "weiter" | "w" => BrowseCommand::Change(Intent::Next),
            "zurück" | "zurueck" | "z" => BrowseCommand::Change(Intent::Previous),
            "kontakt" => {
                let id = rest
                    .parse::<usize>()
                    .map_err(|_| format!("Ungültige Nummer: '{rest}'"))?;
                BrowseCommand::Contact(PostingId(id))
            }
            "hilfe" | "?" => BrowseCommand::Help,
            "ende" | "q" => BrowseCommand::Quit,
            other => return Err(format!("Unbekannter Befehl '{other}', 'hilfe' zeigt alle")),
        };
        Ok(command)
    }
}

/// Stages the intent on the caller's task so tickets follow input order.
fn stage(session: &ListingSession, intent: Intent) -> Result<Ticket, ListingError> {
    match intent {
        Intent::Canton(canton) => Ok(session.stage_canton(canton)),
        Intent::Profession(profession) => Ok(session.stage_profession(profession)),
        Intent::Page(page) => session.stage_page(page),
        Intent::Next => session.stage_next_page(),
        Intent::Previous => session.stage_previous_page(),
    }
}

pub(crate) async fn run_list(args: ListArgs) -> Result<(), AppError> {
    let config = load_config(&args.data)?;
    telemetry::init(&config.telemetry)?;

    let dataset = fetch_dataset(&config).await?;
    let page_size = config.listing.page_size;
    let filter = FilterState::new(args.canton, args.profession);
    let mut state = WidgetState::new(page_size).with_filter(filter);
    if let Some(page) = args.page {
        let total = total_pages(matching_count(&dataset, &state.filter), page_size);
        state = state.go_to_page(page, total)?;
    }

    print!("{}", render_view(&derive_view(&dataset, &state), current_year()));
    Ok(())
}

pub(crate) async fn run_cantons(args: DataArgs) -> Result<(), AppError> {
    let config = load_config(&args)?;
    telemetry::init(&config.telemetry)?;

    let dataset = fetch_dataset(&config).await?;
    for (canton, zip_codes) in dataset.cantons().summary() {
        println!("{canton:<4}{zip_codes:>6} PLZ");
    }
    Ok(())
}

pub(crate) async fn run_browse(args: BrowseArgs) -> Result<(), AppError> {
    let mut config = load_config(&args.data)?;
    if let Some(delay_ms) = args.delay_ms {
        config.listing.transition_delay = Duration::from_millis(delay_ms);
    }
    telemetry::init(&config.telemetry)?;

    let dataset = Arc::new(fetch_dataset(&config).await?);
    let delay = config.listing.transition_delay;
    let session = Arc::new(ListingSession::new(
        dataset,
        config.listing.page_size,
        delay,
    ));
    let year = current_year();

    print!("{}", render_view(&session.view(), year));
    println!("\n{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        while pending.try_join_next().is_some() {}
        if line.trim().is_empty() {
            continue;
        }
        let command = match BrowseCommand::parse(&line, session.dataset().profession_options()) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => println!("{HELP}"),
            BrowseCommand::Professions => {
                for (index, name) in session.dataset().profession_options().iter().enumerate() {
                    println!("{:>3}  {name}", index + 1);
                }
            }
            BrowseCommand::Contact(id) => match session.contact(id) {
                Ok(contact) => print!("{}", render_contact(&contact, year)),
                Err(err) => println!("{err}"),
            },
            BrowseCommand::Change(intent) => {
                let ticket = match stage(&session, intent) {
                    Ok(ticket) => ticket,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };
                if !delay.is_zero() {
                    println!("Aktualisiere ...");
                }
                let session = Arc::clone(&session);
                pending.spawn(async move {
                    match session.settle(ticket).await {
                        Transition::Rendered(view) => print!("{}", render_view(&view, year)),
                        Transition::Superseded => debug!("transition superseded by newer input"),
                    }
                });
            }
        }
    }

    while pending.join_next().await.is_some() {}
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lehrstellen::listing::{
        contact_view, CantonIndex, ContactFields, Dataset, Location, OpenApprenticeship, Posting,
    };

    fn posting(name: &str, zip: &str, year: Option<i32>) -> Posting {
        Posting {
            id: Default::default(),
            profession: "Metallbauer/-in (Metallbau) EFZ".to_string(),
            location: Location {
                name: name.to_string(),
                street: "Industriestrasse".to_string(),
                house_number: "4".to_string(),
                zip_code: zip.to_string(),
                locality: "Zürich".to_string(),
            },
            open_apprenticeships: year
                .map(|year| {
                    vec![OpenApprenticeship {
                        year: Some(year),
                        ..OpenApprenticeship::default()
                    }]
                })
                .unwrap_or_default(),
            contact: ContactFields::default(),
        }
    }

    fn dataset(count: usize) -> Dataset {
        let postings = (0..count)
            .map(|i| posting(&format!("Betrieb {i}"), "8000", (i == 1).then_some(2026)))
            .collect();
        Dataset::new(postings, CantonIndex::from_zip_map([("8000", "ZH")]))
    }

    #[test]
    fn renders_sections_and_pager() {
        let view = derive_view(&dataset(12), &WidgetState::new(10));

        let text = render_view(&view, 2025);

        assert!(text.starts_with("Kanton: alle | Ausbildungsberuf: alle\n"));
        assert!(text.contains("12 Lehrbetriebe, Seite 1 von 2"));
        let open = text.find("Offene Lehrstellen").expect("open section");
        let other = text.find("Weitere Lehrbetriebe").expect("other section");
        assert!(open < other);
        assert!(text.contains("● Offene Lehrstelle 2026"));
        assert!(text.contains("○ Offene Lehrstelle 2025"));
        assert!(text.contains("Industriestrasse 4"));
        assert!(text.trim_end().ends_with("(«) [1] 2 »"));
    }

    #[test]
    fn renders_empty_result() {
        let state = WidgetState::new(10).select_canton(Some("BE".to_string()));
        let view = derive_view(&dataset(3), &state);

        let text = render_view(&view, 2025);

        assert!(text.contains("Kanton: BE"));
        assert!(text.contains("Keine Lehrbetriebe gefunden."));
        assert!(!text.contains("Seite"));
    }

    #[test]
    fn pager_marks_disabled_next_on_last_page() {
        let state = WidgetState::new(10).go_to_page(2, 2).expect("page 2 exists");
        let view = derive_view(&dataset(12), &state);

        let controls = view.pagination.expect("two pages");
        assert_eq!(render_pager(&controls), "« 1 [2] (»)");
    }

    #[test]
    fn contact_without_details_says_so() {
        let dataset = dataset(2);
        let contact = contact_view(&dataset, PostingId(0)).expect("posting exists");

        let text = render_contact(&contact, 2025);

        assert!(text.contains("Kontaktdaten Bewerbung\n  keine Angaben"));
        assert!(!text.contains("Mehr über das Unternehmen"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn later_input_wins_when_settled_concurrently() {
        let session = Arc::new(ListingSession::new(
            Arc::new(dataset(25)),
            10,
            Duration::from_millis(1),
        ));

        let first = stage(&session, Intent::Page(3)).expect("page 3 exists");
        let second = stage(&session, Intent::Previous).expect("page 2 exists");
        let mut pending = JoinSet::new();
        for ticket in [first, second] {
            let session = Arc::clone(&session);
            pending.spawn(async move { session.settle(ticket).await });
        }
        while pending.join_next().await.is_some() {}

        assert_eq!(session.state().page.current, 2);
        assert!(stage(&session, Intent::Page(4)).is_err());
    }

    #[test]
    fn parses_browse_commands() {
        let professions = vec!["Metallbaupraktiker/-in EBA".to_string()];

        assert_eq!(
            BrowseCommand::parse("kanton ZH", &professions),
            Ok(BrowseCommand::Change(Intent::Canton(Some("ZH".to_string()))))
        );
        assert_eq!(
            BrowseCommand::parse("canton -", &professions),
            Ok(BrowseCommand::Change(Intent::Canton(None)))
        );
        assert_eq!(
            BrowseCommand::parse("beruf", &professions),
            Ok(BrowseCommand::Change(Intent::Profession(None)))
        );
        assert_eq!(
            BrowseCommand::parse("beruf 1", &professions),
            Ok(BrowseCommand::Change(Intent::Profession(Some(
                "Metallbaupraktiker/-in EBA".to_string()
            ))))
        );
        assert!(BrowseCommand::parse("beruf 2", &professions).is_err());
        assert_eq!(
            BrowseCommand::parse("Seite 3", &professions),
            Ok(BrowseCommand::Change(Intent::Page(3)))
        );
        assert_eq!(
            BrowseCommand::parse("kontakt 7", &professions),
            Ok(BrowseCommand::Contact(PostingId(7)))
        );
        assert!(BrowseCommand::parse("seite zwei", &professions).is_err());
        assert!(BrowseCommand::parse("springen", &professions).is_err());
    }
}
