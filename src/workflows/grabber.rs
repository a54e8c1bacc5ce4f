use log::{debug, info, warn};
use std::collections::HashMap;

use crate::config::GrabberConfig;
use crate::domain::error::GrabError;
use crate::domain::models::{
    AcquisitionOutcome, FailureReason, MediaAsset, SearchQuery, SubtitleCandidate,
};
use crate::domain::ports::{AttributeParser, MetadataReader, SubtitleCatalog};
use crate::infra::release_parser::ReleaseNameParser;
use crate::workflows::matchers::FilenameMatcher;

/// Decides, per media asset, which subtitles to fetch and fetches them.
pub struct SubtitleGrabber<C, M, P = ReleaseNameParser> {
    catalog: C,
    metadata: M,
    matcher: FilenameMatcher<P>,
    config: GrabberConfig,
}

impl<C, M, P> SubtitleGrabber<C, M, P>
where
    C: SubtitleCatalog,
    M: MetadataReader,
    P: AttributeParser,
{
    pub fn new(catalog: C, metadata: M, matcher: FilenameMatcher<P>, config: GrabberConfig) -> Self {
        Self {
            catalog,
            metadata,
            matcher,
            config,
        }
    }

    #[cfg(test)]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// False once the catalog reports a remaining allowance of zero.
    pub fn has_downloads(&self) -> bool {
        self.catalog.remaining_downloads() != Some(0)
    }

    /// Desired languages without a local subtitle, in priority order.
    pub fn missing_languages(&self, asset: &MediaAsset) -> Vec<String> {
        self.config
            .languages
            .iter()
            .filter(|lang| !asset.existing_languages.contains(*lang))
            .cloned()
            .collect()
    }

    /// Run the acquisition steps for one asset.
    ///
    /// Classified failures come back as `AcquisitionOutcome::Failed`; an `Err`
    /// is an unclassified collaborator failure or a broken matcher contract.
    pub fn grab(&mut self, asset: &MediaAsset) -> Result<AcquisitionOutcome, GrabError> {
        let missing = self.missing_languages(asset);
        if missing.is_empty() {
            return Ok(AcquisitionOutcome::Exist);
        }

        // Top priority present: lower priority gaps are tolerated
        if !self.config.fetch_all_languages {
            if let Some(top) = self.config.languages.first() {
                if !missing.contains(top) {
                    return Ok(AcquisitionOutcome::Exist);
                }
            }
        }

        if !self.has_downloads() {
            return Ok(AcquisitionOutcome::QuotaExhausted);
        }

        let identifier = match self.read_identifier(asset) {
            Ok(identifier) => identifier,
            Err(GrabError::UnsupportedMetadata { path, field }) => {
                debug!("{path:?} has no <{field}>, skipping");
                return Ok(AcquisitionOutcome::Failed(FailureReason::UnsupportedMetadata));
            }
            Err(e) => return Err(e),
        };

        let candidates = self.search(missing.clone(), identifier)?;
        if candidates.is_empty() {
            return Ok(AcquisitionOutcome::NotFound);
        }

        let matched = self.match_candidates(&asset.reference_name(), &missing, candidates)?;
        if matched.is_empty() {
            return Ok(AcquisitionOutcome::NotFound);
        }

        self.download(asset, &missing, &matched)
    }

    fn read_identifier(&self, asset: &MediaAsset) -> Result<String, GrabError> {
        let field = &self.config.identifier_field;
        self.metadata
            .read_field(&asset.nfo_path, field)?
            .filter(|value| !value.is_empty())
            .ok_or_else(|| GrabError::UnsupportedMetadata {
                path: asset.nfo_path.clone(),
                field: field.clone(),
            })
    }

    /// Catalog search, minus candidates that cannot be downloaded.
    fn search(
        &mut self,
        languages: Vec<String>,
        identifier: String,
    ) -> Result<Vec<SubtitleCandidate>, GrabError> {
        let query = SearchQuery {
            languages,
            identifier,
        };
        let multi_file_support = self.config.multi_file_support;
        let candidates: Vec<SubtitleCandidate> = self
            .catalog
            .search(&query)?
            .into_iter()
            .filter(|c| multi_file_support || !c.is_multi_file())
            .filter(|c| c.file_name().is_some())
            .collect();
        debug!(
            "{} usable candidate(s) for {} [{}]",
            candidates.len(),
            query.identifier,
            query.languages.join(",")
        );
        Ok(candidates)
    }

    /// Best matching candidate per missing language, for languages with an
    /// acceptable match. Candidates in any other language are dropped.
    fn match_candidates(
        &self,
        reference: &str,
        missing: &[String],
        candidates: Vec<SubtitleCandidate>,
    ) -> Result<HashMap<String, SubtitleCandidate>, GrabError> {
        // Grouped in catalog order so ties keep the catalog ranking
        let mut by_language: Vec<(String, Vec<SubtitleCandidate>)> = Vec::new();
        for candidate in candidates {
            if !missing.contains(&candidate.language) {
                debug!("Ignoring unrequested {} candidate {}", candidate.language, candidate.id);
                continue;
            }
            match by_language.iter().position(|(lang, _)| *lang == candidate.language) {
                Some(i) => by_language[i].1.push(candidate),
                None => by_language.push((candidate.language.clone(), vec![candidate])),
            }
        }

        let mut matched = HashMap::new();
        for (language, mut group) in by_language {
            let names: Vec<&str> = group
                .iter()
                .map(|c| c.file_name().unwrap_or_default())
                .collect();
            match self.matcher.best_match_index(reference, &names)? {
                Some(index) => {
                    debug!(
                        "Best {language} match for {reference}: {} ({} downloads)",
                        names[index],
                        group[index].download_count.unwrap_or_default()
                    );
                    matched.insert(language, group.swap_remove(index));
                }
                None => debug!("No acceptable {language} match for {reference}"),
            }
        }
        Ok(matched)
    }

    fn download(
        &mut self,
        asset: &MediaAsset,
        missing: &[String],
        matched: &HashMap<String, SubtitleCandidate>,
    ) -> Result<AcquisitionOutcome, GrabError> {
        let mut downloaded: Vec<String> = Vec::new();
        let mut quota_reached = false;

        for language in missing {
            let Some(candidate) = matched.get(language) else {
                continue;
            };

            if candidate.is_multi_file() && !self.config.multi_file_support {
                let err = GrabError::UnsupportedFormat {
                    id: candidate.id.clone(),
                    files: candidate.files.len(),
                };
                warn!("{err}");
                return Ok(AcquisitionOutcome::Failed(FailureReason::UnsupportedFormat));
            }

            if !self.has_downloads() {
                info!("Download limit reached while processing {:?}", asset.base);
                quota_reached = true;
                break;
            }

            let Some(file) = candidate.primary_file() else {
                continue;
            };
            let destination = asset.subtitle_path(language, &self.config.subtitle_extension);

            if let Err(e) = self.catalog.download_item(file, &destination) {
                // Refused at the limit: the quota verdict belongs to this asset
                if !self.has_downloads() {
                    info!("Download limit reached while processing {:?}: {e:#}", asset.base);
                    quota_reached = true;
                    break;
                }
                if downloaded.is_empty() {
                    return Err(e.into());
                }
                warn!("Download of {language} subtitles failed: {e:#}");
                break;
            }

            if destination.is_file() {
                info!("Downloaded {destination:?}");
                downloaded.push(language.clone());
                if !self.config.fetch_all_languages {
                    break;
                }
            } else {
                warn!("{}", GrabError::DownloadVerificationFailed { path: destination });
            }
        }

        if !downloaded.is_empty() {
            return Ok(AcquisitionOutcome::Downloaded(downloaded));
        }
        if quota_reached {
            return Ok(AcquisitionOutcome::QuotaExhausted);
        }
        Ok(AcquisitionOutcome::Failed(FailureReason::DownloadVerificationFailed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::SubtitleFile;
    use crate::workflows::testing::{candidate, FakeCatalog, FakeMetadata};
    use std::collections::BTreeSet;
    use std::fs::{self, File};
    use std::path::Path;
    use tempfile::TempDir;

    const RELEASE: &str = "Movie.2010.720p.BluRay.x264-SPARKS";

    fn grabber(
        catalog: FakeCatalog,
        languages: &[&str],
        fetch_all_languages: bool,
    ) -> SubtitleGrabber<FakeCatalog, FakeMetadata> {
        let mut config = GrabberConfig::new(languages.iter().map(|s| s.to_string()).collect());
        config.fetch_all_languages = fetch_all_languages;
        SubtitleGrabber::new(
            catalog,
            FakeMetadata(Some("tt0111161".to_string())),
            FilenameMatcher::new(ReleaseNameParser),
            config,
        )
    }

    fn asset(dir: &Path, existing: &[&str]) -> MediaAsset {
        let nfo_path = dir.join(format!("{RELEASE}.nfo"));
        File::create(&nfo_path).unwrap();
        File::create(dir.join(format!("{RELEASE}.mkv"))).unwrap();
        let existing: BTreeSet<String> = existing.iter().map(|s| s.to_string()).collect();
        MediaAsset::new(nfo_path, existing)
    }

    #[test]
    fn test_all_languages_exist() {
        let temp_dir = TempDir::new().unwrap();
        let mut grabber = grabber(FakeCatalog::new(vec![]), &["en", "es"], false);

        let outcome = grabber.grab(&asset(temp_dir.path(), &["en", "es"])).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::Exist);
        assert!(grabber.catalog().searches.is_empty());
    }

    #[test]
    fn test_top_priority_present_skips_search() {
        let temp_dir = TempDir::new().unwrap();
        let mut grabber = grabber(FakeCatalog::new(vec![]), &["en", "es"], false);

        let outcome = grabber.grab(&asset(temp_dir.path(), &["en"])).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::Exist);
        assert!(grabber.catalog().searches.is_empty());
    }

    #[test]
    fn test_top_priority_missing_searches() {
        let temp_dir = TempDir::new().unwrap();
        let mut grabber = grabber(FakeCatalog::new(vec![]), &["en", "es"], false);

        let outcome = grabber.grab(&asset(temp_dir.path(), &["es"])).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::NotFound);
        assert_eq!(grabber.catalog().searches.len(), 1);
        assert_eq!(grabber.catalog().searches[0].languages, vec!["en".to_string()]);
        assert_eq!(grabber.catalog().searches[0].identifier, "tt0111161");
    }

    #[test]
    fn test_fetch_all_searches_lower_priority_gaps() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = FakeCatalog::new(vec![candidate(2, "es", &format!("{RELEASE}.srt"))]);
        let mut grabber = grabber(catalog, &["en", "es"], true);

        let asset = asset(temp_dir.path(), &["en"]);
        let outcome = grabber.grab(&asset).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::Downloaded(vec!["es".to_string()]));
        assert!(asset.subtitle_path("es", "srt").is_file());
    }

    #[test]
    fn test_downloads_matching_candidate() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = FakeCatalog::new(vec![
            candidate(1, "en", "Movie.2010.HDTV.XviD-LOL"),
            candidate(2, "en", &format!("{RELEASE}.srt")),
        ]);
        let mut grabber = grabber(catalog, &["en"], false);

        let asset = asset(temp_dir.path(), &[]);
        let outcome = grabber.grab(&asset).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::Downloaded(vec!["en".to_string()]));
        assert_eq!(
            grabber.catalog().downloads,
            vec![(2, asset.subtitle_path("en", "srt"))]
        );
        assert!(temp_dir.path().join(format!("{RELEASE}.en.srt")).is_file());
    }

    #[test]
    fn test_quota_exhausted_before_search() {
        let temp_dir = TempDir::new().unwrap();
        let mut catalog = FakeCatalog::new(vec![candidate(1, "en", RELEASE)]);
        catalog.remaining = Some(0);
        let mut grabber = grabber(catalog, &["en"], false);

        let outcome = grabber.grab(&asset(temp_dir.path(), &[])).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::QuotaExhausted);
        assert!(grabber.catalog().searches.is_empty());
    }

    #[test]
    fn test_unsupported_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let mut grabber = grabber(FakeCatalog::new(vec![]), &["en"], false);
        grabber.metadata = FakeMetadata(None);

        let outcome = grabber.grab(&asset(temp_dir.path(), &[])).unwrap();
        assert_eq!(
            outcome,
            AcquisitionOutcome::Failed(FailureReason::UnsupportedMetadata)
        );
        assert!(grabber.catalog().searches.is_empty());
    }

    #[test]
    fn test_no_acceptable_match_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = FakeCatalog::new(vec![candidate(
            1,
            "en",
            "Movie.2010.1080p.WEB-DL.DD5.1.H264-FGT",
        )]);
        let mut grabber = grabber(catalog, &["en"], false);

        let outcome = grabber.grab(&asset(temp_dir.path(), &[])).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::NotFound);
        assert!(grabber.catalog().downloads.is_empty());
    }

    #[test]
    fn test_multi_file_and_nameless_candidates_are_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let mut multi = candidate(1, "en", RELEASE);
        multi.files.push(SubtitleFile {
            remote_id: 11,
            file_name: Some(format!("{RELEASE}.cd2")),
        });
        let mut nameless = candidate(2, "en", RELEASE);
        nameless.files[0].file_name = None;
        let mut grabber = grabber(FakeCatalog::new(vec![multi, nameless]), &["en"], false);

        let outcome = grabber.grab(&asset(temp_dir.path(), &[])).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::NotFound);
    }

    #[test]
    fn test_priority_stops_after_first_download() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = FakeCatalog::new(vec![
            candidate(1, "es", RELEASE),
            candidate(2, "en", RELEASE),
        ]);
        let mut grabber = grabber(catalog, &["en", "es"], false);

        let outcome = grabber.grab(&asset(temp_dir.path(), &[])).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::Downloaded(vec!["en".to_string()]));
        assert_eq!(grabber.catalog().downloads.len(), 1);
    }

    #[test]
    fn test_priority_falls_back_to_lower_language() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = FakeCatalog::new(vec![candidate(1, "es", RELEASE)]);
        let mut grabber = grabber(catalog, &["en", "es"], false);

        let outcome = grabber.grab(&asset(temp_dir.path(), &[])).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::Downloaded(vec!["es".to_string()]));
    }

    #[test]
    fn test_fetch_all_downloads_in_priority_order() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = FakeCatalog::new(vec![
            candidate(1, "fr", RELEASE),
            candidate(2, "en", RELEASE),
        ]);
        let mut grabber = grabber(catalog, &["en", "es", "fr"], true);

        let outcome = grabber.grab(&asset(temp_dir.path(), &[])).unwrap();
        assert_eq!(
            outcome,
            AcquisitionOutcome::Downloaded(vec!["en".to_string(), "fr".to_string()])
        );
    }

    #[test]
    fn test_quota_rechecked_between_downloads() {
        let temp_dir = TempDir::new().unwrap();
        let mut catalog = FakeCatalog::new(vec![
            candidate(1, "en", RELEASE),
            candidate(2, "es", RELEASE),
        ]);
        catalog.remaining = Some(1);
        let mut grabber = grabber(catalog, &["en", "es"], true);

        let outcome = grabber.grab(&asset(temp_dir.path(), &[])).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::Downloaded(vec!["en".to_string()]));
        assert_eq!(grabber.catalog().downloads.len(), 1);
    }

    #[test]
    fn test_unwritten_download_fails_verification() {
        let temp_dir = TempDir::new().unwrap();
        let mut catalog = FakeCatalog::new(vec![candidate(1, "en", RELEASE)]);
        catalog.write_files = false;
        let mut grabber = grabber(catalog, &["en"], false);

        let outcome = grabber.grab(&asset(temp_dir.path(), &[])).unwrap();
        assert_eq!(
            outcome,
            AcquisitionOutcome::Failed(FailureReason::DownloadVerificationFailed)
        );
    }

    #[test]
    fn test_selected_multi_file_candidate_is_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let mut multi = candidate(1, "en", RELEASE);
        multi.files.push(SubtitleFile {
            remote_id: 11,
            file_name: Some(format!("{RELEASE}.cd2")),
        });
        let mut grabber = grabber(FakeCatalog::new(vec![]), &["en"], false);

        let mut matched = HashMap::new();
        matched.insert("en".to_string(), multi);
        let outcome = grabber
            .download(&asset(temp_dir.path(), &[]), &["en".to_string()], &matched)
            .unwrap();
        assert_eq!(
            outcome,
            AcquisitionOutcome::Failed(FailureReason::UnsupportedFormat)
        );
        assert!(grabber.catalog().downloads.is_empty());
    }

    #[test]
    fn test_unrequested_language_only_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let mut catalog = FakeCatalog::new(vec![candidate(1, "fr", RELEASE)]);
        catalog.ignore_language_filter = true;
        let mut grabber = grabber(catalog, &["en"], false);

        let asset = asset(temp_dir.path(), &[]);
        let outcome = grabber.grab(&asset).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::NotFound);
        assert!(grabber.catalog().downloads.is_empty());
        assert!(!asset.subtitle_path("fr", "srt").exists());
    }

    #[test]
    fn test_existing_language_is_not_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let mut catalog = FakeCatalog::new(vec![
            candidate(1, "es", RELEASE),
            candidate(2, "en", RELEASE),
        ]);
        catalog.ignore_language_filter = true;
        let mut grabber = grabber(catalog, &["en", "es"], true);

        let asset = asset(temp_dir.path(), &["es"]);
        let existing = asset.subtitle_path("es", "srt");
        fs::write(&existing, "ORIGINAL").unwrap();

        let outcome = grabber.grab(&asset).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::Downloaded(vec!["en".to_string()]));
        assert_eq!(
            grabber.catalog().downloads,
            vec![(2, asset.subtitle_path("en", "srt"))]
        );
        assert_eq!(fs::read_to_string(&existing).unwrap(), "ORIGINAL");
    }

    #[test]
    fn test_refused_download_at_limit_is_quota_exhausted() {
        let temp_dir = TempDir::new().unwrap();
        let mut catalog = FakeCatalog::new(vec![candidate(1, "en", RELEASE)]);
        catalog.refuse_downloads = true;
        let mut grabber = grabber(catalog, &["en"], false);

        let outcome = grabber.grab(&asset(temp_dir.path(), &[])).unwrap();
        assert_eq!(outcome, AcquisitionOutcome::QuotaExhausted);
        assert_eq!(grabber.catalog().downloads.len(), 1);
    }

    #[test]
    fn test_collaborator_error_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let mut catalog = FakeCatalog::new(vec![]);
        catalog.fail_search = true;
        let mut grabber = grabber(catalog, &["en"], false);

        let err = grabber.grab(&asset(temp_dir.path(), &[])).unwrap_err();
        assert!(matches!(err, GrabError::Collaborator(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
