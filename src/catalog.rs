//! Page and screen descriptors and the job cross product
//!
//! The catalog is plain data: a list of pages to render and a list of device
//! viewport profiles. [`jobs`] pairs every page with every screen. Nothing in
//! here touches the filesystem or spawns processes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A named page to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    /// Short unique name, used as the output filename prefix
    pub name: String,
    /// Target URL handed to the renderer
    pub url: String,
}

impl PageDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Parse a `NAME=URL` pair as given on the command line.
    ///
    /// The URL must be absolute; names may not be empty or contain path
    /// separators since they end up in file names.
    pub fn parse(spec: &str) -> Result<Self> {
        let (name, raw_url) = spec
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("expected NAME=URL, got '{}'", spec)))?;
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(Error::Config(format!("invalid page name '{}'", name)));
        }
        let url = url::Url::parse(raw_url.trim())
            .map_err(|e| Error::Config(format!("invalid URL for page '{}': {}", name, e)))?;
        Ok(Self::new(name, url.as_str()))
    }
}

/// A named device viewport profile
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenDescriptor {
    pub name: String,
    /// Device pixel ratio of the real device
    pub dpi_zoom: f64,
    /// Viewport width in CSS pixels
    pub css_width: u32,
    /// Viewport height in CSS pixels
    pub css_height: u32,
    /// Height with the browser toolbars collapsed, where known
    pub css_height2: Option<u32>,
}

impl ScreenDescriptor {
    pub fn new(name: impl Into<String>, dpi_zoom: f64, css_width: u32, css_height: u32) -> Self {
        Self {
            name: name.into(),
            dpi_zoom,
            css_width,
            css_height,
            css_height2: None,
        }
    }

    pub fn with_alternate_height(mut self, css_height2: u32) -> Self {
        self.css_height2 = Some(css_height2);
        self
    }
}

/// One (page, screen) pairing, rendered into exactly one image
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub page: PageDescriptor,
    pub screen: ScreenDescriptor,
}

impl Job {
    pub fn new(page: PageDescriptor, screen: ScreenDescriptor) -> Self {
        Self { page, screen }
    }

    /// `page--screen`, the identity used in log lines
    pub fn label(&self) -> String {
        format!("{}--{}", self.page.name, self.screen.name)
    }

    /// File name of the screenshot for this job.
    ///
    /// Width and height are zero-padded to four digits so a directory listing
    /// sorts by viewport size within each page.
    pub fn output_file_name(&self) -> String {
        output_file_name(
            &self.page.name,
            self.screen.css_width,
            self.screen.css_height,
            &self.screen.name,
        )
    }

    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.output_file_name())
    }
}

/// `<page>--<WWWW>,<HHHH>--<screen>.png`
pub fn output_file_name(page: &str, width: u32, height: u32, screen: &str) -> String {
    format!("{}--{:04},{:04}--{}.png", page, width, height, screen)
}

/// Pair every page with every screen, page-major.
pub fn jobs(pages: &[PageDescriptor], screens: &[ScreenDescriptor]) -> Vec<Job> {
    pages
        .iter()
        .flat_map(|p| screens.iter().map(move |s| Job::new(p.clone(), s.clone())))
        .collect()
}

/// Reject job lists in which two jobs would write the same file.
pub fn check_unique_outputs(jobs: &[Job]) -> Result<()> {
    let mut seen = HashSet::new();
    for job in jobs {
        let name = job.output_file_name();
        if !seen.insert(name.clone()) {
            return Err(Error::Config(format!(
                "two jobs write the same output file '{}'",
                name
            )));
        }
    }
    Ok(())
}

/// Keep only the items whose name appears in `names`, in catalog order.
///
/// Every requested name must exist; a typo on the command line should not
/// silently produce an empty batch.
pub fn select<T, F>(items: Vec<T>, names: &[String], name_of: F) -> Result<Vec<T>>
where
    F: Fn(&T) -> &str,
{
    if names.is_empty() {
        return Ok(items);
    }
    for wanted in names {
        if !items.iter().any(|i| name_of(i) == wanted) {
            return Err(Error::Config(format!("unknown name '{}'", wanted)));
        }
    }
    Ok(items
        .into_iter()
        .filter(|i| names.iter().any(|n| n == name_of(i)))
        .collect())
}

/// Add a `-tall` variant for every screen that has an alternate height.
pub fn with_alternate_heights(screens: Vec<ScreenDescriptor>) -> Vec<ScreenDescriptor> {
    let mut out = Vec::with_capacity(screens.len() * 2);
    for screen in screens {
        let tall = screen.css_height2.map(|h| ScreenDescriptor {
            name: format!("{}-tall", screen.name),
            css_height: h,
            css_height2: None,
            ..screen.clone()
        });
        out.push(screen);
        out.extend(tall);
    }
    out
}

pub const DEFAULT_PAGE_URL: &str = "https://en.wikipedia.org/wiki/Main_Page";

/// Default page list
pub fn builtin_pages() -> Vec<PageDescriptor> {
    vec![PageDescriptor::new("1main", DEFAULT_PAGE_URL)]
}

/// Device profiles covering common phones, tablets, laptops and desktops.
///
/// Heights are the visible viewport with browser toolbars shown; where known,
/// the alternate height is the viewport once the toolbars scroll away.
pub fn builtin_screens() -> Vec<ScreenDescriptor> {
    vec![
        ScreenDescriptor::new("iphone-5", 2.0, 320, 460).with_alternate_height(528),
        ScreenDescriptor::new("iphone-678", 2.0, 375, 559).with_alternate_height(627),
        ScreenDescriptor::new("iphone-678p", 2.608, 414, 628).with_alternate_height(696),
        ScreenDescriptor::new("iphone-X", 3.0, 375, 633).with_alternate_height(701),
        ScreenDescriptor::new("iphone-Xmax", 3.0, 414, 717).with_alternate_height(785),
        ScreenDescriptor::new("android-1", 1.5, 360, 568),
        ScreenDescriptor::new("android-s8", 1.5, 360, 617),
        ScreenDescriptor::new("android-xperia", 2.0, 360, 511),
        ScreenDescriptor::new("android-xperia-kbd", 2.0, 360, 268),
        ScreenDescriptor::new("android-julia", 2.748, 393, 658),
        ScreenDescriptor::new("android-julia-kbd", 2.748, 393, 368),
        ScreenDescriptor::new("android-pixel2", 2.625, 412, 604),
        ScreenDescriptor::new("android-pixel4", 2.625, 412, 769),
        ScreenDescriptor::new("tablet-tab-s5", 2.25, 712, 970),
        ScreenDescriptor::new("tablet-tab-s3", 2.0, 768, 904),
        ScreenDescriptor::new("tablet-tab-s3-lscape", 2.0, 1024, 648),
        ScreenDescriptor::new("tablet-tab-4", 1.0, 800, 1159),
        ScreenDescriptor::new("tablet-ipad-mini2019", 2.0, 768, 954),
        ScreenDescriptor::new("tablet-ipad-air2019", 2.0, 834, 1042),
        ScreenDescriptor::new("tablet-ipad-pro2018", 2.0, 1024, 1292),
        ScreenDescriptor::new("tablet-ipad-pro2018-lscape", 2.0, 1366, 950),
        ScreenDescriptor::new("macbook-jo", 2.0, 1280, 549),
        ScreenDescriptor::new("desktop-roman", 1.5, 1411, 905),
        ScreenDescriptor::new("desktop-hi", 1.5, 1707, 889),
        ScreenDescriptor::new("desktop-lo", 1.0, 1920, 950),
        ScreenDescriptor::new("desktop-verylo", 1.0, 1366, 668),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iphone5() -> ScreenDescriptor {
        ScreenDescriptor::new("iphone-5", 2.0, 320, 460)
    }

    #[test]
    fn output_name_is_zero_padded() {
        let job = Job::new(PageDescriptor::new("1main", DEFAULT_PAGE_URL), iphone5());
        assert_eq!(job.output_file_name(), "1main--0320,0460--iphone-5.png");
        assert_eq!(job.label(), "1main--iphone-5");
    }

    #[test]
    fn cross_product_contains_every_pair_once() {
        let pages = vec![
            PageDescriptor::new("a", "https://a.test/"),
            PageDescriptor::new("b", "https://b.test/"),
        ];
        let screens = builtin_screens();
        let all = jobs(&pages, &screens);
        assert_eq!(all.len(), pages.len() * screens.len());

        let names: HashSet<String> = all.iter().map(|j| j.label()).collect();
        assert_eq!(names.len(), all.len());
        assert!(jobs(&[], &screens).is_empty());
        assert!(jobs(&pages, &[]).is_empty());
    }

    #[test]
    fn builtin_catalog_has_no_output_collisions() {
        let all = jobs(&builtin_pages(), &with_alternate_heights(builtin_screens()));
        check_unique_outputs(&all).expect("builtin catalog collides");
    }

    #[test]
    fn duplicate_outputs_are_rejected() {
        let page = PageDescriptor::new("p", "https://p.test/");
        let all = jobs(&[page.clone(), page], &[iphone5()]);
        assert!(matches!(check_unique_outputs(&all), Err(Error::Config(_))));
    }

    #[test]
    fn alternate_heights_add_tall_variants() {
        let screens = with_alternate_heights(vec![
            iphone5().with_alternate_height(528),
            ScreenDescriptor::new("desktop-lo", 1.0, 1920, 950),
        ]);
        let names: Vec<&str> = screens.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["iphone-5", "iphone-5-tall", "desktop-lo"]);
        assert_eq!(screens[1].css_height, 528);
        assert_eq!(screens[1].css_width, 320);
    }

    #[test]
    fn select_filters_and_rejects_unknown_names() {
        let picked = select(builtin_screens(), &["desktop-lo".into(), "iphone-5".into()], |s| {
            s.name.as_str()
        })
        .unwrap();
        let names: Vec<&str> = picked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["iphone-5", "desktop-lo"]);

        let err = select(builtin_screens(), &["nokia-3310".into()], |s| s.name.as_str());
        assert!(err.is_err());
    }

    #[test]
    fn page_spec_parsing() {
        let p = PageDescriptor::parse("2docs=https://example.com/docs").unwrap();
        assert_eq!(p.name, "2docs");
        assert_eq!(p.url, "https://example.com/docs");

        assert!(PageDescriptor::parse("no-equals-sign").is_err());
        assert!(PageDescriptor::parse("=https://example.com/").is_err());
        assert!(PageDescriptor::parse("a/b=https://example.com/").is_err());
        assert!(PageDescriptor::parse("x=not a url").is_err());
    }
}
