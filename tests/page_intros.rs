use std::{cell::RefCell, rc::Rc};

use curtain::{
    IntroConfig, Page, Prop, Runtime, Scope, SiteConfig, Stage, TargetId, Timeline,
    TimelineOptions, pages,
};

fn schedule(page: Page) -> (Stage, TargetId, Timeline) {
    let mut stage = Stage::new();
    let root = pages::build_scene(&mut stage, None, page);
    let mut scope = Scope::new("intro");
    let shared = Rc::new(RefCell::new(Stage::new()));
    let steps = pages::intro_script(page, &IntroConfig::default());
    let tl = pages::intro_timeline(
        &mut stage,
        root,
        &steps,
        TimelineOptions::default().delay(1.0).seed(11),
        &mut scope,
        &shared,
    )
    .unwrap();
    (stage, root, tl)
}

#[test]
fn intro_steps_run_back_to_back() {
    for page in [Page::Question, Page::Subject, Page::Signal] {
        let (_stage, _root, tl) = schedule(page);
        let entries = tl.schedule();
        assert!(!entries.is_empty(), "{page:?}");
        assert_eq!(entries[0].start, 0.0);
        let end = entries
            .iter()
            .map(|e| e.start + e.duration)
            .fold(0.0, f64::max);
        assert!((tl.duration() - end).abs() < 1e-9);
        assert!((tl.total_duration() - end - 1.0).abs() < 1e-9);
    }
}

#[test]
fn floating_words_use_a_shuffled_half_second_stagger() {
    let (stage, root, tl) = schedule(Page::Question);
    let floats = stage.query(root, "text-float");
    assert_eq!(floats.len(), 4);
    let mut starts: Vec<f64> = floats.iter().map(|f| tl.starts_for(*f)[0]).collect();
    let first = starts.iter().copied().fold(f64::INFINITY, f64::min);
    starts.sort_by(f64::total_cmp);
    for (i, s) in starts.iter().enumerate() {
        assert!((s - first - i as f64 * 0.5).abs() < 1e-9);
    }
}

#[test]
fn subject_paragraphs_split_into_lines() {
    let (stage, root, tl) = schedule(Page::Subject);
    let para = stage.query_one(root, "#text-para-main").unwrap();
    let lines = stage.query(para, "line");
    assert_eq!(lines.len(), 3);
    let a = tl.starts_for(lines[0])[0];
    let b = tl.starts_for(lines[1])[0];
    assert!((b - a - 0.05).abs() < 1e-9);
}

#[test]
fn mounted_intro_waits_out_the_delay() {
    let rt = Runtime::init(SiteConfig {
        seed: Some(5),
        ..SiteConfig::default()
    })
    .unwrap();
    let root = pages::build_scene(&mut rt.stage().borrow_mut(), None, Page::Subject);
    let mut scope = Scope::new("subject");
    pages::mount(&rt, Page::Subject, root, &mut scope).unwrap();

    let image = rt.stage().borrow().query_one(root, "#image-main").unwrap();
    assert_eq!(rt.stage().borrow().value(image, Prop::Opacity), 0.0);
    assert_eq!(rt.stage().borrow().value(image, Prop::Y), 200.0);

    rt.tick(0.5);
    assert_eq!(rt.stage().borrow().value(image, Prop::Opacity), 0.0);

    for _ in 0..200 {
        rt.tick(0.05);
    }
    assert_eq!(rt.stage().borrow().value(image, Prop::Opacity), 1.0);
    assert_eq!(rt.stage().borrow().value(image, Prop::Y), 0.0);

    scope.teardown();
    let header = rt.stage().borrow().query_one(root, "#text-header").unwrap();
    assert!(rt.stage().borrow().query(header, "char").is_empty());
}
