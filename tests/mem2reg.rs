use ssir::ir::prelude::*;
use ssir::pass::MemPass;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn dce_cascades_from_load_to_store() {
    init_logging();
    let mut func = Function::new("dce");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    builder.append_to(entry);
    let t_i32 = builder.func.types.int(32);
    let v = builder.variable(t_i32, StorageClass::Function);
    let c5 = builder.const_int(t_i32, 5);
    let store = builder.store(v, c5);
    let x = builder.load(v);
    builder.ret();

    let load = func.dfg.get_def(x).unwrap();
    let pass = MemPass::new();
    let mut deleted = Vec::new();
    pass.dce_inst(&mut func, load, |inst| deleted.push(inst));

    // The load dies, the variable loses its last load, and the store follows.
    assert_eq!(deleted, vec![load, store]);
    assert!(!func.dfg.contains_inst(load));
    assert!(!func.dfg.contains_inst(store));
    // The declaration and the constant stay.
    assert!(func.dfg.get_def(v).is_some());
    assert!(func.dfg.get_def(c5).is_some());
}

#[test]
fn dce_keeps_stores_while_loads_remain() {
    let mut func = Function::new("dce_live");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    builder.append_to(entry);
    let t_i32 = builder.func.types.int(32);
    let v = builder.variable(t_i32, StorageClass::Function);
    let c5 = builder.const_int(t_i32, 5);
    let store = builder.store(v, c5);
    let x = builder.load(v);
    let y = builder.load(v);
    builder.ret_value(y);

    let dead_load = func.dfg.get_def(x).unwrap();
    let pass = MemPass::new();
    let mut deleted = Vec::new();
    pass.dce_inst(&mut func, dead_load, |inst| deleted.push(inst));

    assert_eq!(deleted, vec![dead_load]);
    assert!(func.dfg.contains_inst(store));
}

#[test]
fn dce_cascades_through_access_chains() {
    let mut func = Function::new("dce_chain");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    builder.append_to(entry);
    let t_i32 = builder.func.types.int(32);
    let t_arr = builder.func.types.array(t_i32, 4);
    let t_elem_ptr = builder.func.types.pointer(t_i32, StorageClass::Function);
    let v = builder.variable(t_arr, StorageClass::Function);
    let c0 = builder.const_int(t_i32, 0);
    let store = builder.store(v, c0);
    let addr = builder.access_chain(t_elem_ptr, v, vec![c0]);
    let x = builder.load(addr);
    builder.ret();

    let load = func.dfg.get_def(x).unwrap();
    let chain = func.dfg.get_def(addr).unwrap();
    let pass = MemPass::new();
    let mut deleted = Vec::new();
    pass.dce_inst(&mut func, load, |inst| deleted.push(inst));

    // Chain becomes unused once the load dies; the store follows once no
    // load can observe the variable.
    assert_eq!(deleted, vec![load, chain, store]);
}

#[test]
fn cfg_cleanup_prunes_unreachable_blocks_and_phis() {
    init_logging();
    let mut func = Function::new("cleanup");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    let a = builder.named_block("a");
    let orphan = builder.named_block("orphan");
    let t_i32 = builder.func.types.int(32);
    builder.append_to(entry);
    let x = builder.const_int(t_i32, 1);
    builder.br(a);
    builder.append_to(orphan);
    let y = builder.const_int(t_i32, 2);
    builder.br(a);
    builder.append_to(a);
    let merged = builder.phi(t_i32, vec![(x, entry), (y, orphan)]);
    builder.ret_value(merged);

    let phi = func.dfg.get_def(merged).unwrap();
    let mut pass = MemPass::new();
    assert!(pass.cfg_cleanup(&mut func));

    assert!(!func.contains_block(orphan));
    for bb in func.layout.blocks() {
        assert!(bb != orphan);
    }
    // The phi no longer references the removed predecessor.
    let incoming: Vec<_> = func.dfg[phi].incoming().collect();
    assert_eq!(incoming, vec![(entry, x)]);

    // Re-running on the clean function changes nothing.
    assert!(!pass.cfg_cleanup(&mut func));
}

#[test]
fn cfg_cleanup_removes_mutually_referencing_orphans() {
    let mut func = Function::new("orphan_pair");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    let a = builder.named_block("a");
    let b1 = builder.named_block("b1");
    let b2 = builder.named_block("b2");
    let t_i32 = builder.func.types.int(32);
    builder.append_to(entry);
    builder.br(a);
    builder.append_to(a);
    builder.ret();
    // An unreachable cycle with a phi over an unreachable predecessor.
    builder.append_to(b1);
    let y = builder.const_int(t_i32, 7);
    builder.br(b2);
    builder.append_to(b2);
    builder.phi(t_i32, vec![(y, b1)]);
    builder.br(b1);

    let mut pass = MemPass::new();
    assert!(pass.cfg_cleanup(&mut func));
    assert!(!func.contains_block(b1));
    assert!(!func.contains_block(b2));
    let blocks: Vec<_> = func.layout.blocks().collect();
    assert_eq!(blocks, vec![entry, a]);
    assert!(!pass.cfg_cleanup(&mut func));
}

#[test]
fn type2undef_caches_one_undef_per_type() {
    let mut func = Function::new("undef");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    builder.append_to(entry);
    let t_i32 = builder.func.types.int(32);
    let t_f32 = builder.func.types.float(32);
    builder.variable(t_i32, StorageClass::Function);
    builder.variable(t_f32, StorageClass::Function);
    builder.ret();

    let mut pass = MemPass::new();
    let u1 = pass.type2undef(&mut func, t_i32);
    let u2 = pass.type2undef(&mut func, t_i32);
    assert_eq!(u1, u2);
    let u3 = pass.type2undef(&mut func, t_f32);
    assert_ne!(u1, u3);

    let entry_insts = func.layout.insts(entry);
    let undefs = entry_insts
        .iter()
        .filter(|&&i| func.dfg[i].opcode() == Opcode::Undef)
        .count();
    assert_eq!(undefs, 2);
    // Declarations stay contiguous at function start.
    assert_eq!(func.dfg[entry_insts[0]].opcode(), Opcode::Variable);
    assert_eq!(func.dfg[entry_insts[1]].opcode(), Opcode::Variable);
    assert_eq!(func.dfg[entry_insts[2]].opcode(), Opcode::Undef);
    assert_eq!(func.dfg[entry_insts[3]].opcode(), Opcode::Undef);
}

#[test]
fn scalar_variable_with_plain_refs_is_a_target() {
    let mut func = Function::new("classify");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    builder.append_to(entry);
    let t_i32 = builder.func.types.int(32);
    let v = builder.variable(t_i32, StorageClass::Function);
    let c = builder.const_int(t_i32, 1);
    builder.store(v, c);
    builder.load(v);

    let mut pass = MemPass::new();
    assert!(pass.is_target_var(&func, v));
    assert!(pass.is_target_var(&func, v));
}

#[test]
fn non_constant_index_chain_disqualifies() {
    let mut func = Function::new("classify_chain");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    builder.append_to(entry);
    let t_i32 = builder.func.types.int(32);
    let t_arr = builder.func.types.array(t_i32, 4);
    let t_elem_ptr = builder.func.types.pointer(t_i32, StorageClass::Function);
    let idx = builder.param(t_i32);
    let v = builder.variable(t_arr, StorageClass::Function);
    let addr = builder.access_chain(t_elem_ptr, v, vec![idx]);
    builder.load(addr);

    let mut pass = MemPass::new();
    assert!(!pass.is_target_var(&func, v));
    assert!(!pass.is_target_var(&func, v));
}

#[test]
fn constant_index_chain_and_metadata_are_supported() {
    let mut func = Function::new("classify_ok");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    builder.append_to(entry);
    let t_i32 = builder.func.types.int(32);
    let t_struct = {
        let t = builder.func.types.int(32);
        let f = builder.func.types.float(32);
        builder.func.types.strukt(vec![t, f])
    };
    let t_elem_ptr = builder.func.types.pointer(t_i32, StorageClass::Function);
    let v = builder.variable(t_struct, StorageClass::Function);
    let c0 = builder.const_int(t_i32, 0);
    let addr = builder.access_chain(t_elem_ptr, v, vec![c0]);
    builder.load(addr);
    builder.name(v);
    builder.decorate(v, 4);

    let mut pass = MemPass::new();
    assert!(pass.is_target_var(&func, v));
}

#[test]
fn non_function_storage_is_never_a_target() {
    let mut func = Function::new("classify_input");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    builder.append_to(entry);
    let t_i32 = builder.func.types.int(32);
    let v = builder.variable(t_i32, StorageClass::Input);
    builder.load(v);

    let mut pass = MemPass::new();
    assert!(!pass.is_target_var(&func, v));
}

#[test]
fn classification_is_memoized_until_cleared() {
    let mut func = Function::new("memoized");
    let t_i32 = func.types.int(32);
    let t_elem_ptr = func.types.pointer(t_i32, StorageClass::Function);
    let (v, idx) = {
        let mut builder = FunctionBuilder::new(&mut func);
        let entry = builder.named_block("entry");
        builder.append_to(entry);
        let idx = builder.param(t_i32);
        let v = builder.variable(t_i32, StorageClass::Function);
        builder.load(v);
        (v, idx)
    };

    let mut pass = MemPass::new();
    assert!(pass.is_target_var(&func, v));

    // A disqualifying use added later is not noticed by the cache.
    {
        let entry = func.entry().unwrap();
        let mut builder = FunctionBuilder::new(&mut func);
        builder.append_to(entry);
        builder.access_chain(t_elem_ptr, v, vec![idx]);
    }
    assert!(pass.is_target_var(&func, v));

    // Clearing the caches forces reclassification.
    pass.clear();
    assert!(!pass.is_target_var(&func, v));
}

#[test]
fn collect_target_vars_classifies_every_base() {
    let mut func = Function::new("collect");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    builder.append_to(entry);
    let t_i32 = builder.func.types.int(32);
    let good = builder.variable(t_i32, StorageClass::Function);
    let bad = builder.variable(t_i32, StorageClass::Private);
    let c = builder.const_int(t_i32, 1);
    builder.store(good, c);
    builder.load(good);
    builder.load(bad);
    builder.ret();

    let mut pass = MemPass::new();
    pass.collect_target_vars(&func);
    assert!(pass.is_target_var(&func, good));
    assert!(!pass.is_target_var(&func, bad));
}

#[test]
fn get_ptr_resolves_copies_and_chains() {
    let mut func = Function::new("resolve");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    builder.append_to(entry);
    let t_i32 = builder.func.types.int(32);
    let t_arr = builder.func.types.array(t_i32, 4);
    let t_elem_ptr = builder.func.types.pointer(t_i32, StorageClass::Function);
    let v = builder.variable(t_arr, StorageClass::Function);
    let c0 = builder.const_int(t_i32, 0);
    let cp = builder.copy(v);
    let addr = builder.access_chain(t_elem_ptr, cp, vec![c0]);
    let addr_cp = builder.copy(addr);
    let x = builder.load(addr_cp);
    builder.ret_value(x);

    let load = func.dfg.get_def(x).unwrap();
    let pass = MemPass::new();
    // Copies unwrap to the chain; the chain bottoms out at the variable.
    let (resolved, base) = pass.get_ptr(&func, load);
    assert_eq!(resolved, addr);
    assert_eq!(base, Some(v));
}

#[test]
fn get_ptr_on_a_parameter_has_no_base() {
    let mut func = Function::new("resolve_param");
    let mut builder = FunctionBuilder::new(&mut func);
    let entry = builder.named_block("entry");
    builder.append_to(entry);
    let t_i32 = builder.func.types.int(32);
    let t_ptr = builder.func.types.pointer(t_i32, StorageClass::Function);
    let p = builder.param(t_ptr);
    let x = builder.load(p);
    builder.ret_value(x);

    let load = func.dfg.get_def(x).unwrap();
    let pass = MemPass::new();
    let (resolved, base) = pass.get_ptr(&func, load);
    assert_eq!(resolved, p);
    assert_eq!(base, None);
}
