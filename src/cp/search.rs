//! Local search solver.
//!
//! Simulated annealing over boolean assignments, after presolve.
//!
//! # Algorithm
//!
//! 1. Presolve fixes implied variables and proves infeasibility where it can.
//! 2. Equality constraints with unit coefficients over free variables become
//!    *cardinality groups*. Their members start with exactly the required
//!    number set, and every move on them is a swap (one member on, one
//!    off), so the constraint never breaks. Other free variables flip.
//! 3. Every other hard constraint is a penalized term with weight
//!    `hard_weight` per unit of violation; soft terms cost their penalty.
//! 4. Moves are focused: most of the time a currently unhappy term is
//!    picked and a variable is changed in the direction that repairs it.
//!    For grouped variables several swap partners are sampled and the best
//!    is taken. An uphill move may be chained with a second move that
//!    repairs one of the terms the first move made worse.
//! 5. Metropolis acceptance with geometric cooling. At the end of each
//!    round the search restarts from the best state and reheats.
//! 6. After `stall_iterations` without a new best, the search restarts from
//!    a fresh random assignment. The best state found so far is kept.
//!
//! The search ends on proven optimality, the iteration limit or the
//! wall-clock limit. With the default unbounded iteration limit the time
//! budget decides.
//!
//! # Reference
//! - Kirkpatrick et al. (1983), "Optimization by Simulated Annealing"
//! - Selman, Kautz & Cohen (1994), "Noise Strategies for Improving Local Search"

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::model::{Comparison, CpModel, Penalty};
use super::presolve::presolve;
use super::solver::{CpSolution, CpSolver, SolveStatus, SolverConfig};

/// Probability of picking the next variable from an unhappy term.
const FOCUS_PROBABILITY: f64 = 0.85;
/// Probability of trying a repairing second move after an uphill move.
const CHAIN_PROBABILITY: f64 = 0.6;
/// Swap partners sampled per grouped move.
const PARTNER_SAMPLES: usize = 6;
/// Iterations between wall-clock checks.
const CLOCK_INTERVAL: u64 = 1024;

/// Simulated annealing solver with presolve.
///
/// # Example
/// ```
/// use u_roster::cp::{CpModel, CpSolver, LocalSearchSolver, SolverConfig, SolveStatus};
///
/// let mut model = CpModel::new("pick-two");
/// let vars: Vec<_> = (0..4).map(|i| model.new_bool_var(format!("x{i}"))).collect();
/// model.add_exactly("two", &vars, 2);
///
/// let solution = LocalSearchSolver.solve(&model, &SolverConfig::default());
/// assert_eq!(solution.status, SolveStatus::Optimal);
/// assert_eq!(solution.values.iter().filter(|&&v| v).count(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSearchSolver;

impl CpSolver for LocalSearchSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let started = Instant::now();

        let presolved = match presolve(model) {
            Ok(p) => p,
            Err(reason) => {
                let mut solution =
                    CpSolution::failed(SolveStatus::Infeasible, model.var_count(), reason);
                solution.elapsed = started.elapsed();
                return solution;
            }
        };

        let problem = Problem::build(model, &presolved.values, config.hard_weight);
        debug!(
            model = model.name(),
            vars = model.var_count(),
            free = problem.free.len(),
            propagated = presolved.propagated,
            groups = problem.groups.len(),
            terms = problem.terms.len(),
            lower_bound = presolved.lower_bound,
            "presolve finished"
        );

        let mut rng = StdRng::seed_from_u64(config.seed);
        let initial = problem.initial_assignment(&mut rng);
        let mut search = Search::new(&problem, initial);
        let iterations = search.run(config, presolved.lower_bound, started, &mut rng);

        let values = search.best_values();
        let evaluation = model.evaluate(&values);
        let status = if !evaluation.is_feasible() {
            SolveStatus::Timeout
        } else if evaluation.objective <= presolved.lower_bound {
            SolveStatus::Optimal
        } else {
            SolveStatus::Feasible
        };
        let reason = (!evaluation.is_feasible()).then(|| {
            format!(
                "no assignment satisfying every hard constraint found ({} still violated)",
                evaluation.violated.len()
            )
        });

        CpSolution {
            status,
            values,
            objective: evaluation.objective,
            lower_bound: presolved.lower_bound,
            iterations,
            elapsed: started.elapsed(),
            reason,
        }
    }
}

#[derive(Debug)]
enum TermKind {
    Hard,
    Soft(Penalty),
}

/// A constraint or soft term restricted to free variables.
#[derive(Debug)]
struct Term {
    vars: Vec<(usize, i64)>,
    cmp: Comparison,
    rhs: i64,
    kind: TermKind,
}

impl Term {
    #[inline]
    fn cost(&self, lhs: i64, hard_weight: i64) -> i64 {
        let violation = self.cmp.violation(lhs, self.rhs);
        match &self.kind {
            TermKind::Hard => hard_weight * violation,
            TermKind::Soft(p) => p.cost(violation),
        }
    }

    #[inline]
    fn violation(&self, lhs: i64) -> i64 {
        self.cmp.violation(lhs, self.rhs)
    }

    #[inline]
    fn is_hard(&self) -> bool {
        matches!(self.kind, TermKind::Hard)
    }
}

/// Immutable search problem derived from a model and its presolve.
#[derive(Debug)]
struct Problem {
    fixed: Vec<Option<bool>>,
    free: Vec<usize>,
    terms: Vec<Term>,
    var_terms: Vec<Vec<(usize, i64)>>,
    groups: Vec<(Vec<usize>, usize)>,
    var_group: Vec<Option<usize>>,
    hard_weight: i64,
}

impl Problem {
    fn build(model: &CpModel, fixed: &[Option<bool>], hard_weight: i64) -> Self {
        let n = model.var_count();
        let free: Vec<usize> = (0..n).filter(|&v| fixed[v].is_none()).collect();
        let mut terms = Vec::new();
        let mut groups: Vec<(Vec<usize>, usize)> = Vec::new();
        let mut var_group: Vec<Option<usize>> = vec![None; n];

        let restrict = |expr: &super::model::LinearExpr, rhs: i64| {
            let mut vars = Vec::new();
            let mut rhs = rhs;
            for &(var, c) in expr.terms() {
                match fixed[var.index()] {
                    Some(true) => rhs -= c,
                    Some(false) => {}
                    None => vars.push((var.index(), c)),
                }
            }
            (vars, rhs)
        };

        for c in model.constraints() {
            let (vars, rhs) = restrict(&c.expr, c.rhs);
            if vars.is_empty() {
                continue;
            }
            let groupable = c.cmp == Comparison::Equal
                && vars.len() >= 2
                && rhs >= 0
                && rhs as usize <= vars.len()
                && vars.iter().all(|&(v, coeff)| coeff == 1 && var_group[v].is_none());
            if groupable {
                let gid = groups.len();
                let members: Vec<usize> = vars.iter().map(|&(v, _)| v).collect();
                for &v in &members {
                    var_group[v] = Some(gid);
                }
                groups.push((members, rhs as usize));
            } else {
                terms.push(Term {
                    vars,
                    cmp: c.cmp,
                    rhs,
                    kind: TermKind::Hard,
                });
            }
        }

        for t in model.soft_terms() {
            let (vars, rhs) = restrict(&t.expr, t.rhs);
            // Terms without free variables have a constant cost; the final
            // evaluation against the model accounts for them.
            if vars.is_empty() {
                continue;
            }
            terms.push(Term {
                vars,
                cmp: t.cmp,
                rhs,
                kind: TermKind::Soft(t.penalty.clone()),
            });
        }

        let mut var_terms: Vec<Vec<(usize, i64)>> = vec![Vec::new(); n];
        for (tid, term) in terms.iter().enumerate() {
            for &(v, c) in &term.vars {
                var_terms[v].push((tid, c));
            }
        }

        Self {
            fixed: fixed.to_vec(),
            free,
            terms,
            var_terms,
            groups,
            var_group,
            hard_weight,
        }
    }

    fn initial_assignment(&self, rng: &mut StdRng) -> Vec<bool> {
        let mut values: Vec<bool> = self.fixed.iter().map(|f| f.unwrap_or(false)).collect();
        for (members, count) in &self.groups {
            let mut shuffled = members.clone();
            shuffled.shuffle(rng);
            for &v in shuffled.iter().take(*count) {
                values[v] = true;
            }
        }
        for &v in &self.free {
            if self.var_group[v].is_none() {
                values[v] = rng.random_bool(0.5);
            }
        }
        values
    }
}

/// A set of indices with O(1) insert, remove and random access.
#[derive(Debug, Clone)]
struct IndexedSet {
    items: Vec<usize>,
    pos: Vec<usize>,
}

impl IndexedSet {
    const ABSENT: usize = usize::MAX;

    fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            pos: vec![Self::ABSENT; capacity],
        }
    }

    fn insert(&mut self, x: usize) {
        if self.pos[x] == Self::ABSENT {
            self.pos[x] = self.items.len();
            self.items.push(x);
        }
    }

    fn remove(&mut self, x: usize) {
        let p = self.pos[x];
        if p == Self::ABSENT {
            return;
        }
        self.items.swap_remove(p);
        if p < self.items.len() {
            self.pos[self.items[p]] = p;
        }
        self.pos[x] = Self::ABSENT;
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn get(&self, i: usize) -> usize {
        self.items[i]
    }

    fn clear(&mut self) {
        for &x in &self.items {
            self.pos[x] = Self::ABSENT;
        }
        self.items.clear();
    }
}

/// Members of each cardinality group split by current value.
///
/// Every variable belongs to at most one group, so one position table
/// covers all lists.
#[derive(Debug, Clone)]
struct GroupLists {
    on: Vec<Vec<usize>>,
    off: Vec<Vec<usize>>,
    pos: Vec<usize>,
}

impl GroupLists {
    fn new(groups: usize, vars: usize) -> Self {
        Self {
            on: vec![Vec::new(); groups],
            off: vec![Vec::new(); groups],
            pos: vec![0; vars],
        }
    }

    fn load(&mut self, groups: &[(Vec<usize>, usize)], values: &[bool]) {
        for (gid, (members, _)) in groups.iter().enumerate() {
            self.on[gid].clear();
            self.off[gid].clear();
            for &v in members {
                let list = if values[v] {
                    &mut self.on[gid]
                } else {
                    &mut self.off[gid]
                };
                self.pos[v] = list.len();
                list.push(v);
            }
        }
    }

    /// Moves `v` into the list matching `value`.
    fn set(&mut self, gid: usize, v: usize, value: bool) {
        let (from, to) = if value {
            (&mut self.off[gid], &mut self.on[gid])
        } else {
            (&mut self.on[gid], &mut self.off[gid])
        };
        let p = self.pos[v];
        from.swap_remove(p);
        if p < from.len() {
            self.pos[from[p]] = p;
        }
        self.pos[v] = to.len();
        to.push(v);
    }

    /// Members that would have to change together with `v`.
    fn partners(&self, gid: usize, turning_on: bool) -> &[usize] {
        if turning_on {
            &self.on[gid]
        } else {
            &self.off[gid]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Flip(usize),
    /// `on` becomes true, `off` becomes false (same group).
    Swap { on: usize, off: usize },
}

impl Move {
    fn inverse(self) -> Move {
        match self {
            Move::Flip(v) => Move::Flip(v),
            Move::Swap { on, off } => Move::Swap { on: off, off: on },
        }
    }

    fn touches(self, v: usize) -> bool {
        match self {
            Move::Flip(x) => x == v,
            Move::Swap { on, off } => on == v || off == v,
        }
    }
}

/// Mutable search state.
struct Search<'p> {
    problem: &'p Problem,
    values: Vec<bool>,
    lhs: Vec<i64>,
    costs: Vec<i64>,
    total: i64,
    hard_violation: i64,
    unhappy: IndexedSet,
    groups: GroupLists,
    worsened: Vec<usize>,
    scratch: Vec<i64>,
    touched: Vec<usize>,
    best_values: Vec<bool>,
    best_total: i64,
    best_feasible: Option<(i64, Vec<bool>)>,
}

impl<'p> Search<'p> {
    fn new(problem: &'p Problem, values: Vec<bool>) -> Self {
        let n = values.len();
        let groups = problem.groups.len();
        let terms = problem.terms.len();
        let mut search = Self {
            problem,
            values: Vec::new(),
            lhs: vec![0; terms],
            costs: vec![0; terms],
            total: 0,
            hard_violation: 0,
            unhappy: IndexedSet::new(terms),
            groups: GroupLists::new(groups, n),
            worsened: Vec::new(),
            scratch: vec![0; terms],
            touched: Vec::new(),
            best_values: values.clone(),
            best_total: i64::MAX,
            best_feasible: None,
        };
        search.load(values);
        search.record_best();
        search
    }

    /// Rebuilds every derived structure from a full assignment.
    fn load(&mut self, values: Vec<bool>) {
        let problem = self.problem;
        self.values = values;
        self.total = 0;
        self.hard_violation = 0;
        self.unhappy.clear();

        for (tid, term) in problem.terms.iter().enumerate() {
            let lhs: i64 = term
                .vars
                .iter()
                .filter(|&&(v, _)| self.values[v])
                .map(|&(_, c)| c)
                .sum();
            let cost = term.cost(lhs, problem.hard_weight);
            self.lhs[tid] = lhs;
            self.costs[tid] = cost;
            self.total += cost;
            if term.is_hard() {
                self.hard_violation += term.violation(lhs);
            }
            if cost > 0 {
                self.unhappy.insert(tid);
            }
        }

        self.groups.load(&problem.groups, &self.values);
    }

    fn objective(&self) -> i64 {
        self.total - self.problem.hard_weight * self.hard_violation
    }

    fn record_best(&mut self) -> bool {
        let mut improved = false;
        if self.total < self.best_total {
            self.best_total = self.total;
            self.best_values.clone_from(&self.values);
            improved = true;
        }
        if self.hard_violation == 0 {
            let objective = self.objective();
            let better = match &self.best_feasible {
                Some((best, _)) => objective < *best,
                None => true,
            };
            if better {
                self.best_feasible = Some((objective, self.values.clone()));
                improved = true;
            }
        }
        improved
    }

    fn best_values(&self) -> Vec<bool> {
        match &self.best_feasible {
            Some((_, values)) => values.clone(),
            None => self.best_values.clone(),
        }
    }

    fn accumulate(&mut self, v: usize, new_value: bool) {
        let problem = self.problem;
        let sign = if new_value { 1 } else { -1 };
        for &(tid, c) in &problem.var_terms[v] {
            if self.scratch[tid] == 0 {
                self.touched.push(tid);
            }
            self.scratch[tid] += sign * c;
        }
    }

    fn collect(&mut self, mv: Move) {
        self.touched.clear();
        match mv {
            Move::Flip(v) => {
                let new_value = !self.values[v];
                self.accumulate(v, new_value);
            }
            Move::Swap { on, off } => {
                self.accumulate(on, true);
                self.accumulate(off, false);
            }
        }
        self.touched.sort_unstable();
        self.touched.dedup();
    }

    /// Cost change of a move, without applying it.
    fn delta(&mut self, mv: Move) -> i64 {
        self.collect(mv);
        let problem = self.problem;
        let mut delta = 0;
        for i in 0..self.touched.len() {
            let tid = self.touched[i];
            let d = self.scratch[tid];
            if d != 0 {
                let term = &problem.terms[tid];
                delta += term.cost(self.lhs[tid] + d, problem.hard_weight) - self.costs[tid];
            }
            self.scratch[tid] = 0;
        }
        delta
    }

    fn set_value(&mut self, v: usize, value: bool) {
        self.values[v] = value;
        if let Some(gid) = self.problem.var_group[v] {
            self.groups.set(gid, v, value);
        }
    }

    fn apply(&mut self, mv: Move) {
        self.collect(mv);
        match mv {
            Move::Flip(v) => {
                let value = !self.values[v];
                self.set_value(v, value);
            }
            Move::Swap { on, off } => {
                self.set_value(on, true);
                self.set_value(off, false);
            }
        }

        let problem = self.problem;
        self.worsened.clear();
        for i in 0..self.touched.len() {
            let tid = self.touched[i];
            let d = self.scratch[tid];
            self.scratch[tid] = 0;
            if d == 0 {
                continue;
            }
            let term = &problem.terms[tid];
            let old_lhs = self.lhs[tid];
            let new_lhs = old_lhs + d;
            let new_cost = term.cost(new_lhs, problem.hard_weight);
            if term.is_hard() {
                self.hard_violation += term.violation(new_lhs) - term.violation(old_lhs);
            }
            if new_cost > self.costs[tid] {
                self.worsened.push(tid);
            }
            self.total += new_cost - self.costs[tid];
            self.lhs[tid] = new_lhs;
            self.costs[tid] = new_cost;
            if new_cost > 0 {
                self.unhappy.insert(tid);
            } else {
                self.unhappy.remove(tid);
            }
        }
    }

    /// A variable of term `tid` whose change moves the term toward its
    /// bound, skipping variables touched by `exclude`.
    fn repair_var(&self, tid: usize, exclude: Option<Move>, rng: &mut StdRng) -> Option<usize> {
        let term = &self.problem.terms[tid];
        let lhs = self.lhs[tid];
        let decrease = match term.cmp {
            Comparison::LessOrEqual => true,
            Comparison::GreaterOrEqual => false,
            Comparison::Equal => lhs > term.rhs,
        };
        let len = term.vars.len();
        let start = rng.random_range(0..len);
        for k in 0..len {
            let (v, c) = term.vars[(start + k) % len];
            if exclude.is_some_and(|m| m.touches(v)) {
                continue;
            }
            let value = self.values[v];
            let lowers = (c > 0 && value) || (c < 0 && !value);
            if lowers == decrease {
                return Some(v);
            }
        }
        None
    }

    /// Builds the best move changing `v`, with its cost delta.
    fn move_for(&mut self, v: usize, exclude: Option<Move>, rng: &mut StdRng) -> Option<(Move, i64)> {
        let Some(gid) = self.problem.var_group[v] else {
            let mv = Move::Flip(v);
            return Some((mv, self.delta(mv)));
        };

        let turning_on = !self.values[v];
        let partners_len = self.groups.partners(gid, turning_on).len();
        if partners_len == 0 {
            return None;
        }

        let samples = PARTNER_SAMPLES.min(partners_len);
        let mut best: Option<(Move, i64)> = None;
        for _ in 0..samples {
            let i = rng.random_range(0..partners_len);
            let partner = self.groups.partners(gid, turning_on)[i];
            if exclude.is_some_and(|m| m.touches(partner)) {
                continue;
            }
            let mv = if turning_on {
                Move::Swap { on: v, off: partner }
            } else {
                Move::Swap { on: partner, off: v }
            };
            let delta = self.delta(mv);
            if best.is_none_or(|(_, d)| delta < d) {
                best = Some((mv, delta));
            }
        }
        best
    }

    fn propose(&mut self, rng: &mut StdRng) -> Option<(Move, i64)> {
        let free = &self.problem.free[..];
        let v = if !self.unhappy.is_empty() && rng.random::<f64>() < FOCUS_PROBABILITY {
            let tid = self.unhappy.get(rng.random_range(0..self.unhappy.len()));
            self.repair_var(tid, None, rng)?
        } else {
            free[rng.random_range(0..free.len())]
        };
        self.move_for(v, None, rng)
    }

    fn run(
        &mut self,
        config: &SolverConfig,
        lower_bound: i64,
        started: Instant,
        rng: &mut StdRng,
    ) -> u64 {
        if self.problem.free.is_empty() {
            return 0;
        }

        let t0 = config.initial_temperature.max(1e-6);
        let t_end = config.final_temperature.clamp(1e-6, t0);
        let round_len = (self.problem.free.len() as u64 * 50).clamp(5_000, 200_000);
        let cooling = (t_end / t0).powf(1.0 / round_len as f64);

        let mut temperature = t0;
        let mut round_iter = 0u64;
        let mut stall = 0u64;
        let mut round = 0u32;
        let mut restarts = 0u32;
        let mut iterations = 0u64;

        while iterations < config.max_iterations {
            if iterations % CLOCK_INTERVAL == 0 && started.elapsed() >= config.time_limit {
                debug!(iterations, "time limit reached");
                break;
            }
            if self
                .best_feasible
                .as_ref()
                .is_some_and(|(obj, _)| *obj <= lower_bound)
            {
                break;
            }
            if stall >= config.stall_iterations.max(1) {
                restarts += 1;
                debug!(
                    iterations,
                    restarts,
                    best_total = self.best_total,
                    "search stalled, restarting"
                );
                let problem = self.problem;
                self.load(problem.initial_assignment(rng));
                self.record_best();
                temperature = t0;
                round_iter = 0;
                stall = 0;
                continue;
            }
            iterations += 1;
            round_iter += 1;
            stall += 1;

            if let Some((first, d1)) = self.propose(rng) {
                if d1 <= 0 {
                    self.apply(first);
                } else {
                    self.apply(first);
                    let mut total = d1;
                    let mut second = None;
                    if !self.worsened.is_empty() && rng.random::<f64>() < CHAIN_PROBABILITY {
                        let tid = self.worsened[rng.random_range(0..self.worsened.len())];
                        if let Some(v) = self.repair_var(tid, Some(first), rng) {
                            if let Some((mv, d2)) = self.move_for(v, Some(first), rng) {
                                if d2 < 0 {
                                    total += d2;
                                    second = Some(mv);
                                }
                            }
                        }
                    }
                    let accept =
                        total <= 0 || rng.random::<f64>() < (-(total as f64) / temperature).exp();
                    if accept {
                        if let Some(mv) = second {
                            self.apply(mv);
                        }
                    } else {
                        self.apply(first.inverse());
                    }
                }
                if self.record_best() {
                    stall = 0;
                }
            }

            temperature *= cooling;
            if round_iter >= round_len {
                round += 1;
                if self.total > self.best_total {
                    let best = self.best_values.clone();
                    self.load(best);
                }
                debug!(
                    round,
                    best_total = self.best_total,
                    hard_violation = self.hard_violation,
                    "reheat"
                );
                temperature = t0;
                round_iter = 0;
            }
        }

        iterations
    }
}
