use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::{Stream, StreamExt};
use tokio::{
    sync::{Mutex, Notify},
    task::JoinSet,
    time::Instant,
};

use crate::{
    error::{Error, Result},
    helpers::{matches_date, parse_date},
    hey,
    menu::{
        control::{Action, Control},
        source::{Page, PageSource, Skip},
        surface::MenuSurface,
    },
    say, whisper,
};

pub const NO_SCHEDULE_NOTICE: &str = "No Schedule could be found for that date and team.";
pub const START_FAILED_NOTICE: &str = "Couldn't load that right now, try again in a bit.";
pub const DATE_PROMPT: &str = "Enter the date you would like to see `YYYY-MM-DD` format is accepted.";

const UNKNOWN_COUNT: usize = usize::MAX;

/// Someone pressed one of the menu's controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlEvent {
    pub user_id: u64,
    pub control_id: String,
}

impl ControlEvent {
    pub fn new(user_id: u64, control_id: impl Into<String>) -> Self {
        Self {
            user_id,
            control_id: control_id.into(),
        }
    }
}

/// One interactive pagination session bound to a single displayed message.
pub struct MenuSession<S, D> {
    source: Mutex<S>,
    surface: D,
    controls: Vec<Control>,
    author_id: u64,
    owner_ids: Vec<u64>,
    page_start: usize,
    timeout: Duration,
    prompt_timeout: Duration,
    current_page: AtomicUsize,
    // last page count the source reported, readable without the source lock
    page_count: AtomicUsize,
    running: AtomicBool,
    gate: Mutex<()>,
    stopped: Notify,
}

impl<S, D> MenuSession<S, D>
where
    S: PageSource,
    D: MenuSurface,
{
    pub fn new(source: S, surface: D, controls: Vec<Control>, author_id: u64) -> Self {
        let count = source.page_count();
        Self {
            source: Mutex::new(source),
            surface,
            controls,
            author_id,
            owner_ids: Vec::new(),
            page_start: 0,
            timeout: Duration::from_secs(60),
            prompt_timeout: Duration::from_secs(30),
            current_page: AtomicUsize::new(0),
            page_count: AtomicUsize::new(count.unwrap_or(UNKNOWN_COUNT)),
            running: AtomicBool::new(false),
            gate: Mutex::new(()),
            stopped: Notify::new(),
        }
    }

    pub fn owners(mut self, owner_ids: Vec<u64>) -> Self {
        self.owner_ids = owner_ids;
        self
    }

    pub fn page_start(mut self, page_start: usize) -> Self {
        self.page_start = page_start;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    pub fn current_page(&self) -> usize {
        self.current_page.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    fn known_count(&self) -> Option<usize> {
        match self.page_count.load(Ordering::SeqCst) {
            UNKNOWN_COUNT => None,
            n => Some(n),
        }
    }

    fn remember_count(&self, count: Option<usize>) {
        self.page_count
            .store(count.unwrap_or(UNKNOWN_COUNT), Ordering::SeqCst);
    }

    fn visible_controls(&self) -> Vec<Control> {
        let count = self.known_count();
        self.controls
            .iter()
            .filter(|c| c.is_visible(count))
            .cloned()
            .collect()
    }

    fn is_authorized(&self, user_id: u64) -> bool {
        user_id == self.author_id || self.owner_ids.contains(&user_id)
    }

    /// Fetches `index` and remembers where the source settled, all under the
    /// source lock.
    async fn fetch(&self, index: usize, skip: Skip) -> Result<(Page, usize)> {
        let mut source = self.source.lock().await;
        let fetched = source.fetch_page(index, skip).await;
        self.remember_count(source.page_count());
        let page = fetched?;
        Ok((page, source.settled_index(index)))
    }

    /// Shows the opening page. Returns `false`, after telling the channel,
    /// when the source has nothing to show; the session should not run then.
    /// Any other failure is also reported to the channel before it is returned,
    /// so whoever asked for the menu always gets an answer.
    pub async fn start(&self) -> Result<bool> {
        match self.fetch(self.page_start, Skip::None).await {
            Ok((page, settled)) => {
                self.current_page.store(settled, Ordering::SeqCst);
                self.surface.render(&page, &self.visible_controls()).await?;
                self.running.store(true, Ordering::SeqCst);
                Ok(true)
            }
            Err(Error::NotFound { .. }) | Err(Error::NoSchedule { .. }) => {
                let msg = self.source.lock().await.empty_message();
                self.surface.say(&msg).await?;
                Ok(false)
            }
            Err(e) => {
                if let Err(say_err) = self.surface.say(START_FAILED_NOTICE).await {
                    hey!("Failed to report a menu that couldn't start: {}", say_err);
                }
                Err(e)
            }
        }
    }

    pub async fn show_page(&self, index: usize, skip: Skip) -> Result<()> {
        let fetched = self.fetch(index, skip).await;
        if !self.is_running() {
            return Ok(());
        }
        match fetched {
            Ok((page, settled)) => {
                self.current_page.store(settled, Ordering::SeqCst);
                self.surface.render(&page, &self.visible_controls()).await
            }
            Err(Error::NoSchedule { .. }) => self.surface.notice(NO_SCHEDULE_NOTICE).await,
            Err(e) => Err(e),
        }
    }

    /// Like `show_page`, but wraps around when the page count is known and
    /// treats a missing page as a no-op.
    pub async fn show_checked_page(&self, target: isize) -> Result<()> {
        let index = match self.known_count() {
            Some(0) => return Ok(()),
            Some(max) if target >= max as isize => 0,
            Some(max) if target < 0 => max - 1,
            Some(_) => target as usize,
            None if target < 0 => return Ok(()),
            None => target as usize,
        };
        match self.show_page(index, Skip::None).await {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }

    async fn stop(&self) -> Result<()> {
        if self.running.swap(false, Ordering::SeqCst) {
            self.stopped.notify_one();
            self.surface.delete().await?;
        }
        Ok(())
    }

    async fn choose_date(&self) -> Result<()> {
        let Some(reply) = self
            .surface
            .prompt(DATE_PROMPT, matches_date, self.prompt_timeout)
            .await?
        else {
            return Ok(());
        };
        let Some(date) = parse_date(&reply) else {
            return Ok(());
        };
        say!("Menu searching from {}", date);

        let prepared = {
            let mut source = self.source.lock().await;
            source.set_date(date)?;
            let prepared = source.prepare().await;
            self.remember_count(source.page_count());
            prepared
        };
        match prepared {
            Ok(()) => self.show_page(0, Skip::None).await,
            Err(Error::NoSchedule { .. }) => {
                self.surface
                    .say(&format!(
                        "Sorry No schedule was found for the date range {}",
                        date.format("%Y-%m-%d")
                    ))
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn perform(&self, action: Action) -> Result<()> {
        let current = self.current_page() as isize;
        match action {
            Action::Previous => self.show_checked_page(current - 1).await,
            Action::Next => self.show_checked_page(current + 1).await,
            Action::First => self.show_page(0, Skip::None).await,
            Action::Last => match self.known_count() {
                Some(n) if n > 0 => self.show_page(n - 1, Skip::None).await,
                _ => Ok(()),
            },
            Action::SkipBack => self.show_page(0, Skip::Prev).await,
            Action::SkipForward => self.show_page(0, Skip::Next).await,
            Action::Stop => self.stop().await,
            Action::ChooseDate => self.choose_date().await,
        }
    }

    /// Handles one control activation. Nothing escapes: errors are logged.
    pub async fn dispatch(&self, event: ControlEvent) {
        if !self.is_authorized(event.user_id) || !self.is_running() {
            return;
        }
        let count = self.known_count();
        let Some(control) = self
            .controls
            .iter()
            .find(|c| c.id == event.control_id && c.is_visible(count))
        else {
            return;
        };

        let result = if control.exclusive {
            let _gate = self.gate.lock().await;
            if !self.is_running() {
                return;
            }
            self.perform(control.action).await
        } else {
            self.perform(control.action).await
        };

        if let Err(e) = result {
            hey!("Ignored error on menu control {}: {}", control.id, e);
        }
    }
}

impl<S, D> MenuSession<S, D>
where
    S: PageSource + 'static,
    D: MenuSurface + 'static,
{
    /// Feeds control events into the session until it is stopped, the event
    /// stream ends, or nobody allowed to use it has pressed anything for the
    /// idle timeout. Each activation runs on its own task so a slow exclusive
    /// control doesn't hold up stop or the date prompt.
    pub async fn run<E>(self: Arc<Self>, mut events: E)
    where
        E: Stream<Item = ControlEvent> + Unpin + Send,
    {
        let mut tasks = JoinSet::new();
        let mut deadline = Instant::now() + self.timeout;

        loop {
            tokio::select! {
                _ = self.stopped.notified() => break,
                next = tokio::time::timeout_at(deadline, events.next()) => match next {
                    Ok(Some(event)) => {
                        if !self.is_authorized(event.user_id) {
                            continue;
                        }
                        deadline = Instant::now() + self.timeout;
                        let session = Arc::clone(&self);
                        tasks.spawn(async move { session.dispatch(event).await });
                    }
                    Ok(None) => break,
                    Err(_) => {
                        whisper!("Menu timed out after {:?}", self.timeout);
                        break;
                    }
                },
            }
        }

        if self.running.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.surface.clear_controls().await {
                hey!("Failed to clear menu controls: {}", e);
            }
        }

        while tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::menu::control::{schedule_controls, standard_controls};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Render(Page, Vec<&'static str>),
        Notice(String),
        Say(String),
        Delete,
        ClearControls,
        PromptDeleted,
    }

    #[derive(Default)]
    struct FakeSurface {
        calls: StdMutex<Vec<Call>>,
        replies: StdMutex<Vec<String>>,
    }

    impl FakeSurface {
        fn with_replies(replies: &[&str]) -> Self {
            Self {
                calls: StdMutex::new(Vec::new()),
                replies: StdMutex::new(replies.iter().map(|s| s.to_string()).collect()),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn last_page(&self) -> Option<Page> {
            self.calls().into_iter().rev().find_map(|c| match c {
                Call::Render(page, _) => Some(page),
                _ => None,
            })
        }
    }

    #[async_trait]
    impl MenuSurface for FakeSurface {
        async fn render(&self, page: &Page, controls: &[Control]) -> Result<()> {
            self.push(Call::Render(page.clone(), controls.iter().map(|c| c.id).collect()));
            Ok(())
        }

        async fn notice(&self, text: &str) -> Result<()> {
            self.push(Call::Notice(text.to_string()));
            Ok(())
        }

        async fn say(&self, text: &str) -> Result<()> {
            self.push(Call::Say(text.to_string()));
            Ok(())
        }

        async fn delete(&self) -> Result<()> {
            self.push(Call::Delete);
            Ok(())
        }

        async fn clear_controls(&self) -> Result<()> {
            self.push(Call::ClearControls);
            Ok(())
        }

        async fn prompt(
            &self,
            _question: &str,
            accept: for<'a> fn(&'a str) -> bool,
            timeout: Duration,
        ) -> Result<Option<String>> {
            let replies: Vec<String> = self.replies.lock().unwrap().drain(..).collect();
            if let Some(reply) = replies.into_iter().find(|r| accept(r)) {
                return Ok(Some(reply));
            }
            tokio::time::sleep(timeout).await;
            self.push(Call::PromptDeleted);
            Ok(None)
        }
    }

    struct ListSource {
        pages: Vec<&'static str>,
        count_known: bool,
        delay: Option<Duration>,
        date: Option<NaiveDate>,
        no_schedule_on_fetch: bool,
        no_schedule_on_prepare: bool,
        unreachable: bool,
    }

    impl ListSource {
        fn new(pages: &[&'static str]) -> Self {
            Self {
                pages: pages.to_vec(),
                count_known: true,
                delay: None,
                date: None,
                no_schedule_on_fetch: false,
                no_schedule_on_prepare: false,
                unreachable: false,
            }
        }
    }

    #[async_trait]
    impl PageSource for ListSource {
        fn page_count(&self) -> Option<usize> {
            self.count_known.then_some(self.pages.len())
        }

        async fn fetch_page(&mut self, index: usize, _skip: Skip) -> Result<Page> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.unreachable {
                return Err(Error::upstream("503 from upstream"));
            }
            if self.no_schedule_on_fetch {
                return Err(Error::NoSchedule {
                    searched: "today".to_string(),
                });
            }
            let text = self.pages.get(index).ok_or(Error::NotFound { index })?;
            Ok(Page::Text(text.to_string()))
        }

        async fn prepare(&mut self) -> Result<()> {
            if self.no_schedule_on_prepare {
                return Err(Error::NoSchedule {
                    searched: "then".to_string(),
                });
            }
            self.pages = vec!["fresh"];
            Ok(())
        }

        fn set_date(&mut self, date: NaiveDate) -> Result<()> {
            self.date = Some(date);
            Ok(())
        }
    }

    const AUTHOR: u64 = 1;
    const OWNER: u64 = 2;
    const STRANGER: u64 = 3;

    fn session(source: ListSource, surface: FakeSurface) -> MenuSession<ListSource, FakeSurface> {
        MenuSession::new(source, surface, standard_controls(), AUTHOR).owners(vec![OWNER])
    }

    fn text(s: &str) -> Option<Page> {
        Some(Page::Text(s.to_string()))
    }

    #[tokio::test]
    async fn single_page_renders_without_arrows() {
        let menu = session(ListSource::new(&["only"]), FakeSurface::default());
        assert!(menu.start().await.unwrap());
        assert_eq!(
            menu.surface().calls(),
            vec![Call::Render(Page::Text("only".into()), vec!["stop"])]
        );
    }

    #[tokio::test]
    async fn next_wraps_to_first_and_previous_wraps_to_last() {
        let menu = session(ListSource::new(&["a", "b", "c"]), FakeSurface::default());
        menu.start().await.unwrap();

        menu.dispatch(ControlEvent::new(AUTHOR, "prev")).await;
        assert_eq!(menu.current_page(), 2);
        assert_eq!(menu.surface().last_page(), text("c"));

        menu.dispatch(ControlEvent::new(AUTHOR, "next")).await;
        assert_eq!(menu.current_page(), 0);
        assert_eq!(menu.surface().last_page(), text("a"));
    }

    #[tokio::test]
    async fn first_and_last_jump() {
        let menu = session(ListSource::new(&["a", "b", "c", "d"]), FakeSurface::default());
        menu.start().await.unwrap();

        menu.dispatch(ControlEvent::new(AUTHOR, "last")).await;
        assert_eq!(menu.current_page(), 3);
        menu.dispatch(ControlEvent::new(AUTHOR, "first")).await;
        assert_eq!(menu.current_page(), 0);
    }

    #[tokio::test]
    async fn hidden_controls_do_nothing() {
        let menu = session(ListSource::new(&["a", "b"]), FakeSurface::default());
        menu.start().await.unwrap();

        menu.dispatch(ControlEvent::new(AUTHOR, "last")).await;
        assert_eq!(menu.current_page(), 0);
        assert_eq!(menu.surface().calls().len(), 1);
    }

    #[tokio::test]
    async fn only_author_and_owners_drive_the_menu() {
        let menu = session(ListSource::new(&["a", "b", "c"]), FakeSurface::default());
        menu.start().await.unwrap();

        menu.dispatch(ControlEvent::new(STRANGER, "next")).await;
        assert_eq!(menu.current_page(), 0);

        menu.dispatch(ControlEvent::new(OWNER, "next")).await;
        assert_eq!(menu.current_page(), 1);
    }

    #[tokio::test]
    async fn unknown_count_ignores_missing_pages() {
        let mut source = ListSource::new(&["a", "b"]);
        source.count_known = false;
        let menu = MenuSession::new(source, FakeSurface::default(), schedule_controls(), AUTHOR);
        menu.start().await.unwrap();

        menu.dispatch(ControlEvent::new(AUTHOR, "prev")).await;
        assert_eq!(menu.current_page(), 0);

        menu.dispatch(ControlEvent::new(AUTHOR, "next")).await;
        assert_eq!(menu.current_page(), 1);
        menu.dispatch(ControlEvent::new(AUTHOR, "next")).await;
        assert_eq!(menu.current_page(), 1);
        assert_eq!(menu.surface().last_page(), text("b"));
    }

    #[tokio::test]
    async fn stop_deletes_once_and_freezes_the_menu() {
        let menu = session(ListSource::new(&["a", "b", "c"]), FakeSurface::default());
        menu.start().await.unwrap();

        menu.dispatch(ControlEvent::new(AUTHOR, "stop")).await;
        menu.dispatch(ControlEvent::new(AUTHOR, "stop")).await;
        menu.dispatch(ControlEvent::new(AUTHOR, "next")).await;

        let calls = menu.surface().calls();
        assert_eq!(calls.iter().filter(|c| **c == Call::Delete).count(), 1);
        assert_eq!(calls.len(), 2);
        assert_eq!(menu.current_page(), 0);
        assert!(!menu.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_does_not_wait_for_a_slow_page() {
        let mut source = ListSource::new(&["a", "b", "c"]);
        source.delay = Some(Duration::from_secs(10));
        let menu = Arc::new(session(source, FakeSurface::default()));
        menu.start().await.unwrap();

        let slow = {
            let menu = Arc::clone(&menu);
            tokio::spawn(async move { menu.dispatch(ControlEvent::new(AUTHOR, "next")).await })
        };
        tokio::task::yield_now().await;

        menu.dispatch(ControlEvent::new(AUTHOR, "stop")).await;
        assert_eq!(menu.surface().calls().last(), Some(&Call::Delete));

        slow.await.unwrap();
        // the page that was in flight never reaches the deleted message
        assert_eq!(menu.surface().calls().last(), Some(&Call::Delete));
        assert_eq!(menu.current_page(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_presses_run_one_at_a_time() {
        let mut source = ListSource::new(&["a", "b", "c", "d"]);
        source.delay = Some(Duration::from_secs(5));
        let menu = Arc::new(session(source, FakeSurface::default()));
        menu.start().await.unwrap();

        let before = Instant::now();
        let presses: Vec<_> = (0..2)
            .map(|_| {
                let menu = Arc::clone(&menu);
                tokio::spawn(async move { menu.dispatch(ControlEvent::new(AUTHOR, "next")).await })
            })
            .collect();
        for press in presses {
            press.await.unwrap();
        }

        // the second press only reads the page after the first one landed
        assert_eq!(menu.current_page(), 2);
        assert!(before.elapsed() >= Duration::from_secs(10));
        let rendered: Vec<Page> = menu
            .surface()
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Render(page, _) => Some(page),
                _ => None,
            })
            .collect();
        assert_eq!(
            rendered,
            vec![
                Page::Text("a".into()),
                Page::Text("b".into()),
                Page::Text("c".into())
            ]
        );
    }

    #[tokio::test]
    async fn no_schedule_is_shown_to_the_user() {
        let menu = session(ListSource::new(&["a", "b", "c"]), FakeSurface::default());
        menu.start().await.unwrap();
        menu.source.lock().await.no_schedule_on_fetch = true;

        menu.dispatch(ControlEvent::new(AUTHOR, "next")).await;
        assert_eq!(
            menu.surface().calls().last(),
            Some(&Call::Notice(NO_SCHEDULE_NOTICE.to_string()))
        );
    }

    #[tokio::test]
    async fn empty_source_does_not_start() {
        let menu = session(ListSource::new(&[]), FakeSurface::default());
        assert!(!menu.start().await.unwrap());
        assert!(!menu.is_running());
        assert!(matches!(menu.surface().calls()[0], Call::Say(_)));
    }

    #[tokio::test]
    async fn failed_start_still_answers() {
        let mut source = ListSource::new(&["a", "b"]);
        source.unreachable = true;
        let menu = session(source, FakeSurface::default());
        assert!(matches!(menu.start().await, Err(Error::Upstream(_))));
        assert!(!menu.is_running());
        assert_eq!(
            menu.surface().calls(),
            vec![Call::Say(START_FAILED_NOTICE.to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn bad_date_reply_times_out_quietly() {
        let surface = FakeSurface::with_replies(&["next tuesday", "soon"]);
        let menu = MenuSession::new(
            ListSource::new(&["a"]),
            surface,
            schedule_controls(),
            AUTHOR,
        );
        menu.start().await.unwrap();

        let before = Instant::now();
        menu.dispatch(ControlEvent::new(AUTHOR, "date")).await;
        assert!(before.elapsed() >= Duration::from_secs(30));

        assert_eq!(menu.source.lock().await.date, None);
        assert_eq!(menu.surface().calls().last(), Some(&Call::PromptDeleted));
    }

    #[tokio::test]
    async fn chosen_date_reloads_from_the_first_page() {
        let surface = FakeSurface::with_replies(&["2024-01-05"]);
        let menu = MenuSession::new(
            ListSource::new(&["a", "b"]),
            surface,
            schedule_controls(),
            AUTHOR,
        );
        menu.start().await.unwrap();
        menu.dispatch(ControlEvent::new(AUTHOR, "next")).await;
        assert_eq!(menu.current_page(), 1);

        menu.dispatch(ControlEvent::new(AUTHOR, "date")).await;
        assert_eq!(menu.source.lock().await.date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(menu.current_page(), 0);
        assert_eq!(menu.surface().last_page(), text("fresh"));
    }

    #[tokio::test]
    async fn chosen_date_without_games_says_so() {
        let surface = FakeSurface::with_replies(&["2024-07-04"]);
        let mut source = ListSource::new(&["a"]);
        source.no_schedule_on_prepare = true;
        let menu = MenuSession::new(source, surface, schedule_controls(), AUTHOR);
        menu.start().await.unwrap();

        menu.dispatch(ControlEvent::new(AUTHOR, "date")).await;
        assert_eq!(
            menu.surface().calls().last(),
            Some(&Call::Say(
                "Sorry No schedule was found for the date range 2024-07-04".to_string()
            ))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_clears_its_controls() {
        let menu = Arc::new(session(ListSource::new(&["a", "b"]), FakeSurface::default()));
        menu.start().await.unwrap();

        Arc::clone(&menu).run(futures::stream::pending()).await;
        assert!(!menu.is_running());
        assert_eq!(menu.surface().calls().last(), Some(&Call::ClearControls));
    }

    #[tokio::test]
    async fn run_processes_events_until_stopped() {
        let menu = Arc::new(session(ListSource::new(&["a", "b", "c"]), FakeSurface::default()));
        menu.start().await.unwrap();

        let events = futures::stream::iter(vec![
            ControlEvent::new(STRANGER, "stop"),
            ControlEvent::new(AUTHOR, "stop"),
        ])
        .chain(futures::stream::pending());
        Arc::clone(&menu).run(Box::pin(events)).await;

        let calls = menu.surface().calls();
        assert_eq!(calls.last(), Some(&Call::Delete));
        assert!(!calls.contains(&Call::ClearControls));
    }
}
