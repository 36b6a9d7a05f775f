use chrono::{Datelike, Duration, NaiveDate};

pub const CAROUSEL_LEN: usize = 7;
pub const CAROUSEL_PAST_DAYS: i64 = 1;
pub const TODAY_INDEX: usize = 1;
pub const SELECT_REACH: usize = 2;

const CARD_SPACING_PCT: f32 = 115.0;
const CARD_TILT_DEG: f32 = 15.0;
const CARD_TILT_MAX_DEG: f32 = 45.0;
const CARD_SCALE_STEP: f32 = 0.12;
const CARD_SCALE_MIN: f32 = 0.5;
const CARD_FADE_STEP: f32 = 0.35;
const CARD_STACK_TOP: i32 = 20;

// The window is recomputed from the current date on every read; index 1 is
// always today.
pub fn carousel_window(today: NaiveDate) -> [NaiveDate; CAROUSEL_LEN] {
    std::array::from_fn(|index| today + Duration::days(index as i64 - CAROUSEL_PAST_DAYS))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayFocus {
    Browsing(usize),
    Editing(usize),
}

impl DayFocus {
    pub fn focused_index(self) -> usize {
        match self {
            DayFocus::Browsing(index) | DayFocus::Editing(index) => index,
        }
    }

    #[must_use]
    pub fn select(self, target: usize) -> DayFocus {
        let DayFocus::Browsing(current) = self else {
            return self;
        };
        if target >= CAROUSEL_LEN || target == current {
            return self;
        }

        // Only near days are reachable in one step; today is always reachable.
        if target == TODAY_INDEX || current.abs_diff(target) <= SELECT_REACH {
            DayFocus::Browsing(target)
        } else {
            self
        }
    }

    #[must_use]
    pub fn expand(self) -> DayFocus {
        match self {
            DayFocus::Browsing(index) => DayFocus::Editing(index),
            editing => editing,
        }
    }

    #[must_use]
    pub fn close(self) -> DayFocus {
        match self {
            DayFocus::Editing(index) => DayFocus::Browsing(index),
            browsing => browsing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayout {
    pub offset: i32,
    pub translate_x: f32,
    pub rotation: f32,
    pub scale: f32,
    pub stacking: i32,
    pub opacity: f32,
}

pub fn card_layout(index: usize, focused_index: usize) -> CardLayout {
    let offset = index as i32 - focused_index as i32;
    let distance = offset.unsigned_abs() as f32;

    CardLayout {
        offset,
        translate_x: offset as f32 * CARD_SPACING_PCT,
        rotation: (offset as f32 * -CARD_TILT_DEG).clamp(-CARD_TILT_MAX_DEG, CARD_TILT_MAX_DEG),
        scale: (1.0 - distance * CARD_SCALE_STEP).max(CARD_SCALE_MIN),
        stacking: CARD_STACK_TOP - offset.abs(),
        opacity: (1.0 - distance * CARD_FADE_STEP).max(0.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Carousel,
    Month,
}

#[derive(Debug, Clone)]
pub struct ScheduleScreen {
    mode: ViewMode,
    focus: DayFocus,
    month_cursor: NaiveDate,
    month_expanded: Option<NaiveDate>,
}

impl ScheduleScreen {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            mode: ViewMode::Carousel,
            focus: DayFocus::Browsing(TODAY_INDEX),
            month_cursor: today,
            month_expanded: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn focus(&self) -> DayFocus {
        self.focus
    }

    pub fn month_cursor(&self) -> NaiveDate {
        self.month_cursor
    }

    pub fn visible_month(&self) -> NaiveDate {
        first_day_of_month(self.month_cursor)
    }

    // No day stays expanded across a view-mode switch.
    pub fn set_mode(&mut self, mode: ViewMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.focus = self.focus.close();
        self.month_expanded = None;
    }

    pub fn select_day(&mut self, target: usize) {
        if self.mode == ViewMode::Carousel {
            self.focus = self.focus.select(target);
        }
    }

    pub fn focus_today(&mut self) {
        self.select_day(TODAY_INDEX);
    }

    pub fn expand_focused(&mut self) {
        if self.mode == ViewMode::Carousel {
            self.focus = self.focus.expand();
        }
    }

    pub fn expand_month_cursor(&mut self) {
        if self.mode == ViewMode::Month {
            self.month_expanded = Some(self.month_cursor);
        }
    }

    pub fn close_editor(&mut self) {
        self.focus = self.focus.close();
        self.month_expanded = None;
    }

    pub fn move_month_cursor(&mut self, delta_days: i64) {
        self.month_cursor += Duration::days(delta_days);
    }

    pub fn page_month(&mut self, delta_months: i32) {
        self.month_cursor = shift_month(self.month_cursor, delta_months);
    }

    pub fn expanded_day(&self, window: &[NaiveDate; CAROUSEL_LEN]) -> Option<NaiveDate> {
        match self.mode {
            ViewMode::Carousel => match self.focus {
                DayFocus::Editing(index) => window.get(index).copied(),
                DayFocus::Browsing(_) => None,
            },
            ViewMode::Month => self.month_expanded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Scheduled { day: NaiveDate, task_id: String },
    Inbox { item_id: String },
}

#[derive(Debug, Clone, Default)]
pub struct DeleteConfirm {
    pending: Option<DeleteTarget>,
}

impl DeleteConfirm {
    // Last request wins; there is never more than one pending target.
    pub fn request(&mut self, target: DeleteTarget) {
        self.pending = Some(target);
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn confirm(&mut self) -> Option<DeleteTarget> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<&DeleteTarget> {
        self.pending.as_ref()
    }
}

pub fn first_day_of_month(day: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(day.year(), day.month(), 1).expect("first day of month must be valid")
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).expect("next year date should be valid")
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).expect("next month date should be valid")
    };
    (first_of_next - Duration::days(1)).day()
}

pub fn shift_month(day: NaiveDate, delta: i32) -> NaiveDate {
    let mut year = day.year();
    let mut month = day.month() as i32 + delta;
    while month > 12 {
        year += 1;
        month -= 12;
    }
    while month < 1 {
        year -= 1;
        month += 12;
    }
    let month_u32 = month as u32;
    let max_day = days_in_month(year, month_u32);
    let target_day = day.day().min(max_day);
    NaiveDate::from_ymd_opt(year, month_u32, target_day).expect("shifted month date must be valid")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        CAROUSEL_LEN, DayFocus, DeleteConfirm, DeleteTarget, ScheduleScreen, TODAY_INDEX,
        ViewMode, card_layout, carousel_window, days_in_month, shift_month,
    };

    fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, dom).expect("test date should be valid")
    }

    #[test]
    fn window_spans_yesterday_through_five_days_ahead() {
        let today = day(2026, 8, 6);
        let window = carousel_window(today);

        assert_eq!(window.len(), CAROUSEL_LEN);
        assert_eq!(window[0], day(2026, 8, 5));
        assert_eq!(window[TODAY_INDEX], today);
        assert_eq!(window[6], day(2026, 8, 11));
    }

    #[test]
    fn window_rolls_over_month_boundaries() {
        let window = carousel_window(day(2026, 1, 31));
        assert_eq!(window[2], day(2026, 2, 1));
        assert_eq!(window[6], day(2026, 2, 5));
    }

    #[test]
    fn selection_is_limited_to_near_days() {
        let focus = DayFocus::Browsing(1);
        assert_eq!(focus.select(3), DayFocus::Browsing(3));
        assert_eq!(focus.select(0), DayFocus::Browsing(0));
        assert_eq!(focus.select(4), DayFocus::Browsing(1), "distance 3 is unreachable");
        assert_eq!(focus.select(6), DayFocus::Browsing(1), "distance 5 is unreachable");
    }

    #[test]
    fn today_is_reachable_from_anywhere() {
        let far = DayFocus::Browsing(1).select(3).select(5);
        assert_eq!(far, DayFocus::Browsing(5));
        assert_eq!(far.select(TODAY_INDEX), DayFocus::Browsing(TODAY_INDEX));
    }

    #[test]
    fn selecting_the_focused_or_out_of_range_day_changes_nothing() {
        let focus = DayFocus::Browsing(2);
        assert_eq!(focus.select(2), focus);
        assert_eq!(focus.select(7), focus);
        assert_eq!(focus.select(42), focus);
    }

    #[test]
    fn selection_is_ignored_while_editing() {
        let editing = DayFocus::Browsing(2).expand();
        assert_eq!(editing, DayFocus::Editing(2));
        assert_eq!(editing.select(1), editing);
        assert_eq!(editing.close(), DayFocus::Browsing(2));
    }

    #[test]
    fn expand_and_close_round_trip() {
        let focus = DayFocus::Browsing(3);
        assert_eq!(focus.expand().close(), focus);
        assert_eq!(focus.close(), focus);
        assert_eq!(focus.expand().expand(), DayFocus::Editing(3));
    }

    #[test]
    fn layout_prominence_shrinks_with_distance() {
        let mut previous = card_layout(3, 3);
        assert_eq!(previous.offset, 0);
        assert_eq!(previous.scale, 1.0);
        assert_eq!(previous.opacity, 1.0);

        for index in 4..CAROUSEL_LEN + 4 {
            let layout = card_layout(index, 3);
            assert!(layout.scale <= previous.scale);
            assert!(layout.opacity <= previous.opacity);
            assert!(layout.stacking < previous.stacking || layout.offset == previous.offset);
            assert!(layout.scale < 1.0);
            assert!(layout.opacity < 1.0);
            assert!(layout.stacking < card_layout(3, 3).stacking);
            previous = layout;
        }
    }

    #[test]
    fn layout_rotation_saturates_and_spacing_is_linear() {
        assert_eq!(card_layout(4, 3).rotation, -15.0);
        assert_eq!(card_layout(2, 3).rotation, 15.0);
        assert_eq!(card_layout(6, 3).rotation, -45.0);
        assert_eq!(card_layout(0, 6).rotation, 45.0);
        assert_eq!(card_layout(5, 3).translate_x, 230.0);
    }

    #[test]
    fn mode_switch_collapses_any_expansion() {
        let today = day(2026, 8, 6);
        let mut screen = ScheduleScreen::new(today);
        let window = carousel_window(today);

        screen.expand_focused();
        assert_eq!(screen.expanded_day(&window), Some(today));

        screen.set_mode(ViewMode::Month);
        assert!(matches!(screen.focus(), DayFocus::Browsing(_)));
        assert_eq!(screen.expanded_day(&window), None);

        screen.expand_month_cursor();
        assert_eq!(screen.expanded_day(&window), Some(today));
        screen.set_mode(ViewMode::Carousel);
        assert_eq!(screen.expanded_day(&window), None);
        assert_eq!(screen.mode(), ViewMode::Carousel);
    }

    #[test]
    fn carousel_transitions_are_inert_in_month_mode() {
        let mut screen = ScheduleScreen::new(day(2026, 8, 6));
        screen.set_mode(ViewMode::Month);

        screen.select_day(3);
        screen.expand_focused();
        assert_eq!(screen.focus(), DayFocus::Browsing(TODAY_INDEX));

        screen.set_mode(ViewMode::Carousel);
        screen.expand_month_cursor();
        assert_eq!(screen.expanded_day(&carousel_window(day(2026, 8, 6))), None);
    }

    #[test]
    fn month_cursor_moves_by_days_and_pages_by_months() {
        let mut screen = ScheduleScreen::new(day(2026, 1, 15));
        screen.set_mode(ViewMode::Month);

        screen.move_month_cursor(-15);
        assert_eq!(screen.month_cursor(), day(2025, 12, 31));
        assert_eq!(screen.visible_month(), day(2025, 12, 1));

        screen.page_month(1);
        assert_eq!(screen.month_cursor(), day(2026, 1, 31));
        screen.page_month(1);
        assert_eq!(screen.month_cursor(), day(2026, 2, 28), "cursor clamps to shorter months");
    }

    #[test]
    fn month_arithmetic_handles_year_rollover() {
        assert_eq!(shift_month(day(2026, 1, 10), -1), day(2025, 12, 10));
        assert_eq!(shift_month(day(2025, 12, 10), 1), day(2026, 1, 10));
        assert_eq!(shift_month(day(2026, 3, 31), 11), day(2027, 2, 28));
        assert_eq!(days_in_month(2028, 2), 29);
    }

    #[test]
    fn delete_confirmation_is_two_phase_with_last_request_winning() {
        let mut confirm = DeleteConfirm::default();
        assert!(confirm.pending().is_none());
        assert_eq!(confirm.confirm(), None);

        confirm.request(DeleteTarget::Inbox {
            item_id: "a1".to_string(),
        });
        confirm.request(DeleteTarget::Scheduled {
            day: day(2026, 8, 6),
            task_id: "b2".to_string(),
        });
        assert_eq!(
            confirm.confirm(),
            Some(DeleteTarget::Scheduled {
                day: day(2026, 8, 6),
                task_id: "b2".to_string(),
            })
        );
        assert_eq!(confirm.confirm(), None, "confirm clears the pending target");

        confirm.request(DeleteTarget::Inbox {
            item_id: "c3".to_string(),
        });
        confirm.cancel();
        assert_eq!(confirm.confirm(), None);
    }
}
