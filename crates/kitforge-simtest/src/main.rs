//! KitForge Headless Assembly Harness
//!
//! Loads the sample content pack, sweeps seeds, roles and levels through the
//! assembler and checks the loadout invariants on every generated tree.
//! Runs entirely in-process — no files written, no networking.
//!
//! Usage:
//!   cargo run -p kitforge-simtest
//!   cargo run -p kitforge-simtest -- --verbose

use std::collections::{HashMap, HashSet};

use kitforge_logic::constants::{base_classes, slots};
use kitforge_logic::persistence::{load_loadout, save_loadout, LoadoutSnapshot};
use kitforge_logic::report::AssemblyReport;
use kitforge_logic::validate::validate_tree;
use kitforge_logic::{
    assemble_equipment, assemble_weapon, AssembledItem, AssemblyConfig, AssemblyServices,
    BotContext, Catalog, CatalogHydrator, ContentPack, GenerationRequest, IdSource, ModPool,
    PresetBook, PresetSource, SequentialIds, SpawnChances,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

// ── Sample content (same JSON the tests use) ────────────────────────────
const CONTENT_JSON: &str = include_str!("../../../data/sample_content.json");
const CONFIG_JSON: &str = include_str!("../../../data/sample_config.json");
const CHANCES_JSON: &str = include_str!("../../../data/spawn_chances.json");

const ROLES: &[&str] = &["assault", "marksman", "scav"];
const LEVELS: &[u32] = &[5, 20, 45, 70];
const WEAPONS: &[&str] = &["m4a1", "rhino"];
const EQUIPMENT: &[&str] = &["plate_carrier", "helmet_fast"];
const SEEDS_PER_CASE: u64 = 100;

#[derive(Debug, Deserialize)]
struct ChanceTable {
    weapon: SpawnChances,
    equipment: SpawnChances,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: String) -> Self {
        Self {
            name: name.into(),
            passed,
            detail,
        }
    }
}

struct Content {
    catalog: Catalog,
    presets: PresetBook,
    config: AssemblyConfig,
    chances: ChanceTable,
}

/// One generated tree plus the request state it ended in.
struct Run {
    request: GenerationRequest,
    report: AssemblyReport,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    println!("=== KitForge Assembly Harness ===\n");

    let mut results = Vec::new();

    // 1. Content pack validation
    let content = match load_content(&mut results) {
        Some(c) => c,
        None => {
            print_summary(&results, verbose);
            std::process::exit(1);
        }
    };
    results.extend(validate_content(&content, verbose));

    // 2. Weapon sweep
    results.extend(validate_weapon_sweep(&content, verbose));

    // 3. Co-dependent slot forcing
    results.extend(validate_forcing(&content, verbose));

    // 4. Cylinder magazines
    results.extend(validate_cylinders(&content, verbose));

    // 5. Armor plates by level
    results.extend(validate_armor(&content, verbose));

    // 6. Determinism, snapshots, parallel generation
    results.extend(validate_reproducibility(&content, verbose));

    // ── Summary ──
    let failed = print_summary(&results, verbose);
    if failed > 0 {
        std::process::exit(1);
    }
}

fn print_summary(results: &[TestResult], verbose: bool) -> usize {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );
    failed
}

// ── Assembly helpers ────────────────────────────────────────────────────

fn assemble(
    content: &Content,
    ids: &SequentialIds,
    root: &str,
    bot: BotContext,
    seed: u64,
    weapon: bool,
) -> Option<Run> {
    let hydrator = CatalogHydrator::new(&content.catalog, &content.config);
    let services = AssemblyServices {
        catalog: &content.catalog,
        config: &content.config,
        hydrator: &hydrator,
        presets: &content.presets,
        ids,
    };
    let chances = if weapon {
        content.chances.weapon.clone()
    } else {
        content.chances.equipment.clone()
    };
    let mut request = GenerationRequest::new(
        AssembledItem::root(&format!("root-{}", ids.next_id()), root),
        ModPool::from_catalog(&content.catalog, root),
        chances,
        bot,
    );
    let mut rng = StdRng::seed_from_u64(seed);
    let result = if weapon {
        assemble_weapon(&services, &mut request, &mut rng)
    } else {
        assemble_equipment(&services, &mut request, &mut rng)
    };
    match result {
        Ok(report) => Some(Run { request, report }),
        Err(e) => {
            log::error!("{} seed {}: {}", root, seed, e);
            None
        }
    }
}

fn conflict_pairs(catalog: &Catalog, items: &[AssembledItem]) -> Vec<(String, String)> {
    let tpls: Vec<&str> = items.iter().map(|i| i.tpl.as_str()).collect();
    let mut pairs = Vec::new();
    for a in &tpls {
        let Some(template) = catalog.get(a) else {
            continue;
        };
        for b in &tpls {
            if template.conflicting_items.iter().any(|c| c == b) {
                pairs.push((a.to_string(), b.to_string()));
            }
        }
    }
    pairs
}

// ── 1. Content Pack ─────────────────────────────────────────────────────

fn load_content(results: &mut Vec<TestResult>) -> Option<Content> {
    println!("--- Content Pack ---");
    let pack = match ContentPack::from_json(CONTENT_JSON) {
        Ok(p) => p,
        Err(e) => {
            results.push(TestResult::check("content_parse", false, format!("{}", e)));
            return None;
        }
    };
    let presets = PresetBook::new(pack.presets);
    let catalog = match Catalog::from_templates(pack.templates) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult::check("catalog_build", false, format!("{}", e)));
            return None;
        }
    };
    let config = match AssemblyConfig::from_json(CONFIG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult::check("config_parse", false, format!("{}", e)));
            return None;
        }
    };
    let chances: ChanceTable = match serde_json::from_str(CHANCES_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult::check("chances_parse", false, format!("{}", e)));
            return None;
        }
    };
    results.push(TestResult::check(
        "content_parse",
        true,
        format!("{} templates, {} default presets", catalog.len(), presets.len()),
    ));
    Some(Content {
        catalog,
        presets,
        config,
        chances,
    })
}

fn validate_content(content: &Content, verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();
    let catalog = &content.catalog;

    let mut dangling = Vec::new();
    let mut bad_plates = Vec::new();
    for root in WEAPONS.iter().chain(EQUIPMENT) {
        let pool = ModPool::from_catalog(catalog, root);
        let Some(declared) = pool.slots_for(root) else {
            dangling.push(format!("{} has no slots", root));
            continue;
        };
        for slot in declared.keys() {
            let Some(def) = catalog.get(root).and_then(|t| t.slot(slot)) else {
                continue;
            };
            for id in def.allowed() {
                if !catalog.contains(id) {
                    dangling.push(format!("{}/{} → {}", root, slot, id));
                }
            }
            if let Some(plate) = def.default_plate.as_deref() {
                if !def.allows(plate) || !catalog.is_of_base_class(plate, base_classes::ARMOR_PLATE) {
                    bad_plates.push(format!("{}/{}", root, slot));
                }
            }
        }
    }
    results.push(TestResult::check(
        "content_filters_resolve",
        dangling.is_empty(),
        if dangling.is_empty() {
            "every root slot filter names known templates".into()
        } else {
            dangling.join(", ")
        },
    ));
    results.push(TestResult::check(
        "content_default_plates",
        bad_plates.is_empty(),
        if bad_plates.is_empty() {
            "built-in plates are allowed armor plates".into()
        } else {
            bad_plates.join(", ")
        },
    ));

    let weapons_have_presets = WEAPONS
        .iter()
        .all(|w| content.presets.default_preset(w).is_some());
    results.push(TestResult::check(
        "content_weapon_presets",
        weapons_have_presets,
        format!("default presets for {:?}", WEAPONS),
    ));

    if verbose {
        println!("  {} templates loaded", catalog.len());
    }
    results
}

// ── 2. Weapon Sweep ─────────────────────────────────────────────────────

fn validate_weapon_sweep(content: &Content, verbose: bool) -> Vec<TestResult> {
    println!("--- Weapon Sweep ---");
    let mut results = Vec::new();
    let ids = SequentialIds::new("w");

    let mut runs = 0;
    let mut broken = Vec::new();
    let mut conflicts = Vec::new();
    let mut failed_required = 0;
    let mut missing_ammo = 0;
    let mut sizes: HashMap<&str, (usize, usize)> = HashMap::new();

    for &weapon in WEAPONS {
        for &role in ROLES {
            for &level in LEVELS {
                for seed in 0..SEEDS_PER_CASE {
                    let Some(run) = assemble(content, &ids, weapon, BotContext::new(role, level), seed, true)
                    else {
                        broken.push(format!("{} seed {}: assembly error", weapon, seed));
                        continue;
                    };
                    runs += 1;
                    let items = &run.request.items;

                    let issues = validate_tree(&content.catalog, items, true);
                    if !issues.is_empty() && broken.len() < 5 {
                        broken.push(format!("{} {} L{} seed {}: {:?}", weapon, role, level, seed, issues));
                    }
                    conflicts.extend(conflict_pairs(&content.catalog, items));
                    failed_required += run.report.failed_required();

                    let has_magazine = items
                        .iter()
                        .any(|i| i.slot_id.as_deref() == Some(slots::MAGAZINE));
                    if !has_magazine {
                        missing_ammo += 1;
                    }

                    let entry = sizes.entry(weapon).or_insert((usize::MAX, 0));
                    entry.0 = entry.0.min(items.len());
                    entry.1 = entry.1.max(items.len());
                }
            }
        }
    }

    results.push(TestResult::check(
        "weapon_trees_sound",
        broken.is_empty(),
        if broken.is_empty() {
            format!("{} trees validated", runs)
        } else {
            broken.join("; ")
        },
    ));
    results.push(TestResult::check(
        "weapon_conflicts_respected",
        conflicts.is_empty(),
        if conflicts.is_empty() {
            "no tree carries a conflicting pair".into()
        } else {
            format!("{} conflicting pairs, first {:?}", conflicts.len(), conflicts[0])
        },
    ));
    results.push(TestResult::check(
        "weapon_required_filled",
        failed_required == 0,
        format!("{} required slots left empty", failed_required),
    ));
    results.push(TestResult::check(
        "weapon_ammo_slots_filled",
        missing_ammo == 0,
        format!("{} trees without a magazine", missing_ammo),
    ));

    if verbose {
        for (weapon, (min, max)) in &sizes {
            println!("  {}: {}..{} items per tree", weapon, min, max);
        }
    }
    results
}

// ── 3. Forcing ──────────────────────────────────────────────────────────

fn validate_forcing(content: &Content, verbose: bool) -> Vec<TestResult> {
    println!("--- Co-dependent Slots ---");
    let mut results = Vec::new();
    let ids = SequentialIds::new("f");
    let catalog = &content.catalog;

    let mut mounted = 0;
    let mut unforced = 0;
    let mut stocked = 0;
    let mut stock_unforced = 0;
    for seed in 0..SEEDS_PER_CASE * 4 {
        let Some(run) = assemble(content, &ids, "m4a1", BotContext::new("assault", 45), seed, true) else {
            continue;
        };
        let items = &run.request.items;
        let scope_mount = items.iter().any(|i| {
            i.slot_id.as_deref().is_some_and(|s| {
                kitforge_logic::special::mount_holds_scope(catalog, s, &i.tpl)
            })
        });
        if scope_mount {
            mounted += 1;
            if run.request.spawn_chances.get(slots::SCOPE) != 100.0 {
                unforced += 1;
            }
        }
        if items.iter().any(|i| i.tpl == "buffer_tube") {
            stocked += 1;
            if run.request.spawn_chances.get(slots::STOCK) != 100.0 {
                stock_unforced += 1;
            }
        }
    }

    results.push(TestResult::check(
        "mount_forces_scope_chance",
        mounted > 0 && unforced == 0,
        format!("{} trees with a scope mount, {} left unforced", mounted, unforced),
    ));
    results.push(TestResult::check(
        "buffer_tube_forces_stock",
        stocked > 0 && stock_unforced == 0,
        format!("{} trees with a buffer tube, {} left unforced", stocked, stock_unforced),
    ));

    if verbose {
        println!("  scope mounts in {} of {} trees", mounted, SEEDS_PER_CASE * 4);
    }
    results
}

// ── 4. Cylinder Magazines ───────────────────────────────────────────────

fn validate_cylinders(content: &Content, verbose: bool) -> Vec<TestResult> {
    println!("--- Cylinder Magazines ---");
    let mut results = Vec::new();
    let ids = SequentialIds::new("c");

    let mut mixed = 0;
    let mut short = 0;
    let mut seen_cartridges = HashSet::new();
    for seed in 0..SEEDS_PER_CASE * 2 {
        let Some(run) = assemble(content, &ids, "rhino", BotContext::new("assault", 30), seed, true) else {
            continue;
        };
        let items = &run.request.items;
        let Some(cylinder) = items
            .iter()
            .find(|i| content.catalog.is_of_base_class(&i.tpl, base_classes::CYLINDER_MAGAZINE))
        else {
            short += 1;
            continue;
        };
        let rounds: Vec<&AssembledItem> = items
            .iter()
            .filter(|i| i.parent_id.as_deref() == Some(cylinder.id.as_str()))
            .collect();
        let distinct: HashSet<&str> = rounds.iter().map(|r| r.tpl.as_str()).collect();
        if distinct.len() != 1 {
            mixed += 1;
        }
        if rounds.len() != 6 {
            short += 1;
        }
        seen_cartridges.extend(distinct.into_iter().map(str::to_string));
    }

    results.push(TestResult::check(
        "cylinder_single_cartridge",
        mixed == 0,
        format!("{} cylinders with mixed cartridges", mixed),
    ));
    results.push(TestResult::check(
        "cylinder_fully_loaded",
        short == 0,
        format!("{} cylinders missing or short", short),
    ));
    results.push(TestResult::check(
        "cylinder_cartridge_variety",
        seen_cartridges.len() > 1,
        format!("{} cartridge types seen across seeds", seen_cartridges.len()),
    ));

    if verbose {
        println!("  cartridges: {:?}", seen_cartridges);
    }
    results
}

// ── 5. Armor ────────────────────────────────────────────────────────────

fn validate_armor(content: &Content, verbose: bool) -> Vec<TestResult> {
    println!("--- Armor Plates ---");
    let mut results = Vec::new();
    let ids = SequentialIds::new("a");
    let catalog = &content.catalog;

    let mut broken = Vec::new();
    for &root in EQUIPMENT {
        for &level in LEVELS {
            for seed in 0..SEEDS_PER_CASE {
                let Some(run) = assemble(content, &ids, root, BotContext::new("assault", level), seed, false)
                else {
                    continue;
                };
                let issues = validate_tree(catalog, &run.request.items, true);
                if !issues.is_empty() && broken.len() < 5 {
                    broken.push(format!("{} L{} seed {}: {:?}", root, level, seed, issues));
                }
            }
        }
    }
    results.push(TestResult::check(
        "armor_trees_sound",
        broken.is_empty(),
        if broken.is_empty() {
            "plate carriers and helmets validate".into()
        } else {
            broken.join("; ")
        },
    ));

    // Front plate tier spread for a low and a high level bot.
    let tier_share = |level: u32, class: u8| -> f64 {
        let mut hits = 0;
        let mut total = 0;
        for seed in 0..SEEDS_PER_CASE * 5 {
            let Some(run) = assemble(content, &ids, "plate_carrier", BotContext::new("assault", level), seed, false)
            else {
                continue;
            };
            let front = run
                .request
                .items
                .iter()
                .find(|i| i.slot_id.as_deref() == Some(slots::FRONT_PLATE));
            if let Some(plate) = front {
                total += 1;
                if catalog.get(&plate.tpl).and_then(|t| t.armor_class) == Some(class) {
                    hits += 1;
                }
            }
        }
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    };

    let low = tier_share(10, 3);
    let high = tier_share(60, 5);
    results.push(TestResult::check(
        "armor_low_level_mostly_class3",
        low > 0.4,
        format!("{:.0}% class 3 front plates at level 10", low * 100.0),
    ));
    results.push(TestResult::check(
        "armor_high_level_class5",
        high > 0.3,
        format!("{:.0}% class 5 front plates at level 60", high * 100.0),
    ));

    if verbose {
        println!("  class3@L10 {:.2}, class5@L60 {:.2}", low, high);
    }
    results
}

// ── 6. Reproducibility ──────────────────────────────────────────────────

fn validate_reproducibility(content: &Content, verbose: bool) -> Vec<TestResult> {
    println!("--- Reproducibility ---");
    let mut results = Vec::new();

    let tpls = |seed: u64| -> Vec<String> {
        let ids = SequentialIds::new("r");
        assemble(content, &ids, "m4a1", BotContext::new("assault", 30), seed, true)
            .map(|run| run.request.items.into_iter().map(|i| i.tpl).collect())
            .unwrap_or_default()
    };
    let deterministic = (0..20).all(|seed| tpls(seed) == tpls(seed));
    let varied: HashSet<Vec<String>> = (0..50).map(tpls).collect();
    results.push(TestResult::check(
        "same_seed_same_tree",
        deterministic,
        "20 seeds replayed".into(),
    ));
    results.push(TestResult::check(
        "seeds_vary_trees",
        varied.len() > 5,
        format!("{} distinct trees from 50 seeds", varied.len()),
    ));

    // Snapshot round trip
    let ids = SequentialIds::new("s");
    let mut snapshot = LoadoutSnapshot::new("assault", 30);
    for (seed, root) in [(1, "m4a1"), (2, "rhino")] {
        if let Some(run) = assemble(content, &ids, root, BotContext::new("assault", 30), seed, true) {
            snapshot.push_tree(&run.request.items);
        }
    }
    for (seed, root) in [(3, "plate_carrier"), (4, "helmet_fast")] {
        if let Some(run) = assemble(content, &ids, root, BotContext::new("assault", 30), seed, false) {
            snapshot.push_tree(&run.request.items);
        }
    }
    let mut buf = Vec::new();
    let round_trip = save_loadout(&mut buf, &snapshot)
        .and_then(|_| load_loadout(buf.as_slice()))
        .map(|loaded| loaded == snapshot);
    results.push(TestResult::check(
        "snapshot_round_trip",
        matches!(round_trip, Ok(true)),
        match &round_trip {
            Ok(_) => format!("{} roots, {} items, {} bytes", snapshot.roots.len(), snapshot.items.len(), buf.len()),
            Err(e) => format!("{}", e),
        },
    ));

    // Parallel generation against one catalog and one id source
    let shared_ids = SequentialIds::new("p");
    let produced: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4u64)
            .map(|worker| {
                let shared_ids = &shared_ids;
                scope.spawn(move || {
                    let mut out = Vec::new();
                    for seed in 0..25 {
                        let bot = BotContext::new("assault", 30);
                        if let Some(run) = assemble(content, shared_ids, "m4a1", bot, worker * 100 + seed, true) {
                            out.extend(run.request.items.into_iter().map(|i| i.id));
                        }
                    }
                    out
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_default())
            .collect()
    });
    let unique: HashSet<&String> = produced.iter().collect();
    results.push(TestResult::check(
        "parallel_ids_unique",
        !produced.is_empty() && unique.len() == produced.len(),
        format!("{} ids from 4 workers", produced.len()),
    ));

    if verbose {
        println!("  snapshot size {} bytes", buf.len());
    }
    results
}
